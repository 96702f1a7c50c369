pub(crate) mod chars;
