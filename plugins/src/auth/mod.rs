mod token_source;

pub use token_source::{token_url, LongLivedTokenSource, TOKEN_REFRESH_LEEWAY};
