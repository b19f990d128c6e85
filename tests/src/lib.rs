mod cidr;
mod compile;
