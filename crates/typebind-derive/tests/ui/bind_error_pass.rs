use std::borrow::Cow;
use typebind_derive::bind_error;

#[bind_error]
pub enum DemoError {
    #[error("IO error{}: {source}", format_context(.context))]
    Io {
        #[source]
        source: std::io::Error,
        context: Option<Cow<'static, str>>,
    },

    #[error("Internal error{}: {message}", format_context(.context))]
    Internal { message: Cow<'static, str>, context: Option<Cow<'static, str>> },
}

fn main() {
    let err: DemoError = "boom".into();
    assert!(matches!(err, DemoError::Internal { .. }));

    let res: Result<(), std::io::Error> = Err(std::io::Error::other("io"));
    let err = res.context("reading config").unwrap_err();
    assert!(err.to_string().contains("reading config"));
}
