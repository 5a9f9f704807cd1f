mod clipboard;
mod process;
