use bytes_utils::Str;

pub(crate) const LF: u8 = b'\n';
pub(crate) const CR: u8 = b'\r';

// bom = %xFEFF ; U+FEFF BYTE ORDER MARK
pub(crate) const BOM: &[u8] = "\u{FEFF}".as_bytes();

pub(crate) const EMPTY_STR: Str = Str::from_static("");
pub(crate) const MESSAGE_STR: Str = Str::from_static("message");
