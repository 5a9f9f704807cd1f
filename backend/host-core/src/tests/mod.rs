mod broker;
mod link;
mod termination;
mod utils;
