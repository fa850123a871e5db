//! Reading command input from a file or piped stdin.

use std::fs;
use std::io::{self, IsTerminal, Read};
use std::path::{Path, PathBuf};

/// Where a command's input comes from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum InputSource {
    /// Content already read from stdin
    Stdin(String),
    /// A file to read
    File(PathBuf),
}

impl InputSource {
    /// Name for messages: the file path, or `<stdin>`.
    pub fn display_name(&self) -> String {
        match self {
            InputSource::Stdin(_) => "<stdin>".to_string(),
            InputSource::File(path) => path.display().to_string(),
        }
    }
}

/// Errors that can occur while reading input
#[derive(Debug)]
pub enum InputError {
    /// No file given and stdin is a terminal
    NoTty,
    /// File does not exist
    NotFound(PathBuf),
    /// Reading failed
    Io(io::Error),
    /// Input is not UTF-8
    InvalidUtf8,
}

impl std::fmt::Display for InputError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            InputError::NoTty => write!(f, "No input: pass a file, '-', or pipe content on stdin"),
            InputError::NotFound(path) => write!(f, "File not found: {}", path.display()),
            InputError::Io(e) => write!(f, "Failed to read input: {}", e),
            InputError::InvalidUtf8 => write!(f, "Input is not valid UTF-8"),
        }
    }
}

impl std::error::Error for InputError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            InputError::Io(e) => Some(e),
            _ => None,
        }
    }
}

impl From<io::Error> for InputError {
    fn from(e: io::Error) -> Self {
        if e.kind() == io::ErrorKind::InvalidData {
            InputError::InvalidUtf8
        } else {
            InputError::Io(e)
        }
    }
}

/// Decide the input source for an optional file argument.
///
/// `-` always reads stdin. With no argument stdin is read only when it is
/// piped; an interactive terminal yields [`InputError::NoTty`].
pub fn determine_input_source(file: Option<&Path>) -> Result<InputSource, InputError> {
    match file {
        Some(path) if path.as_os_str() == "-" => read_stdin(),
        Some(path) => {
            if !path.exists() {
                return Err(InputError::NotFound(path.to_path_buf()));
            }
            Ok(InputSource::File(path.to_path_buf()))
        }
        None => {
            if io::stdin().is_terminal() {
                return Err(InputError::NoTty);
            }
            read_stdin()
        }
    }
}

fn read_stdin() -> Result<InputSource, InputError> {
    let mut buffer = String::new();
    io::stdin().read_to_string(&mut buffer)?;
    Ok(InputSource::Stdin(buffer))
}

/// Content of an input source.
pub fn process_input(source: InputSource) -> Result<String, InputError> {
    match source {
        InputSource::Stdin(content) => Ok(content),
        InputSource::File(path) => match fs::read_to_string(&path) {
            Ok(content) => Ok(content),
            Err(e) if e.kind() == io::ErrorKind::NotFound => Err(InputError::NotFound(path)),
            Err(e) => Err(e.into()),
        },
    }
}

/// Shorthand for [`determine_input_source`] followed by [`process_input`].
pub fn read_input(file: Option<&Path>) -> Result<String, InputError> {
    process_input(determine_input_source(file)?)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::NamedTempFile;

    #[test]
    fn test_file_source() {
        let mut file = NamedTempFile::new().unwrap();
        write!(file, "hello\nworld").unwrap();

        let source = determine_input_source(Some(file.path())).unwrap();
        assert_eq!(source, InputSource::File(file.path().to_path_buf()));
        assert_eq!(process_input(source).unwrap(), "hello\nworld");
    }

    #[test]
    fn test_missing_file() {
        let err = determine_input_source(Some(Path::new("/definitely/not/here.txt"))).unwrap_err();
        assert!(matches!(err, InputError::NotFound(_)));
        assert!(err.to_string().contains("here.txt"));
    }

    #[test]
    fn test_invalid_utf8() {
        let mut file = NamedTempFile::new().unwrap();
        file.write_all(&[0xff, 0xfe, 0x00]).unwrap();
        let err = read_input(Some(file.path())).unwrap_err();
        assert!(matches!(err, InputError::InvalidUtf8));
    }

    #[test]
    fn test_stdin_content_passes_through() {
        let source = InputSource::Stdin("piped".to_string());
        assert_eq!(source.display_name(), "<stdin>");
        assert_eq!(process_input(source).unwrap(), "piped");
    }
}
