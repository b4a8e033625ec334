pub mod inline;
pub mod markdown;

pub use inline::{InlineFormatter, InlineOptions};
pub use markdown::{BlockKind, MarkdownConverter, MarkdownDocument};
