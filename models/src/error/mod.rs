pub mod model_error;
pub mod protocol_error;
