#![doc = include_str!("../README.md")]
#![cfg_attr(docsrs, feature(doc_cfg))]

pub use jb_bind as bind;
pub use jb_stream as stream;
pub use jb_utils as utils;
