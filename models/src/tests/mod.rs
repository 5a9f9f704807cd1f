mod envelope;
mod launch;
