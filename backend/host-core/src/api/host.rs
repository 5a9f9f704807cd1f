use crate::error::handler::HandlerError;

/// The current user's home directory, resolved on the host.
pub fn home_dir() -> Result<String, HandlerError> {
    dirs::home_dir()
        .map(|path| path.to_string_lossy().into_owned())
        .ok_or_else(|| HandlerError::failed("Home directory could not be determined"))
}
