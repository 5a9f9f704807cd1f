mod helpers;
mod native;
mod orchestrator;
mod relay;
