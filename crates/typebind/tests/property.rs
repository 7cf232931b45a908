use proptest::prelude::*;
use typebind::Token;
use uuid::Uuid;

proptest! {
    #[test]
    fn token_text_roundtrips(bytes in any::<u128>(), key in "[A-Za-z0-9_]{1,32}") {
        let token = Token::new(Uuid::from_u128(bytes), key);
        let parsed: Token = token.to_string().parse().unwrap();
        prop_assert_eq!(parsed, token);
    }

    #[test]
    fn text_without_a_separator_never_parses(text in "[A-Za-z0-9_-]{0,40}") {
        prop_assert!(text.parse::<Token>().is_err());
    }
}
