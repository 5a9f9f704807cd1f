mod remove_cache;
