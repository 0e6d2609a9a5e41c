pub(crate) mod banner;
pub(crate) mod builtin;
pub(crate) mod fonts;
