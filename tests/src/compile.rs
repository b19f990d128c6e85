mod integration;
mod ordering;
