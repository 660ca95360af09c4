pub(crate) mod binreader;
