mod builder;
mod raw_data;
