// Property tests for the tokenizer

use forthic::tokenizer::{TokenType, Tokenizer};
use proptest::prelude::*;

proptest! {
    // Every well-formed source yields exactly one EOS, and the tokenizer
    // keeps yielding EOS afterwards
    #[test]
    fn token_totality(source in r"[A-Za-z0-9+\-*/ \t\n\.:;\[\]{}]{0,120}") {
        let mut tokenizer = Tokenizer::new(&source, None, false);
        let mut token_count = 0;

        loop {
            let token = match tokenizer.next_token() {
                Ok(token) => token,
                // Malformed definition names are the only failure this
                // alphabet can produce; totality doesn't apply to them
                Err(_) => return Ok(()),
            };
            token_count += 1;
            prop_assert!(token_count < 10_000, "tokenizer failed to terminate");
            if token.token_type == TokenType::Eos {
                break;
            }
        }

        for _ in 0..3 {
            let token = tokenizer.next_token().unwrap();
            prop_assert_eq!(token.token_type, TokenType::Eos);
        }
    }

    // Word tokens slice back out of the source at their recorded offsets
    #[test]
    fn word_location_fidelity(words in proptest::collection::vec("[A-Za-z]{1,8}", 1..8)) {
        let source = words.join(" ");
        let mut tokenizer = Tokenizer::new(&source, None, false);

        loop {
            let token = tokenizer.next_token().unwrap();
            if token.token_type == TokenType::Eos {
                break;
            }
            let start = token.location.start_pos;
            let end = token.location.end_pos.unwrap();
            prop_assert_eq!(&source[start..end], token.text.as_str());
        }
    }

    // Streaming mode never errors: partial strings come back as tokens
    #[test]
    fn streaming_never_errors(source in r"[A-Za-z0-9'\x22 ]{0,60}") {
        let mut tokenizer = Tokenizer::new(&source, None, true);
        let mut token_count = 0;

        loop {
            let token = tokenizer.next_token().unwrap();
            token_count += 1;
            prop_assert!(token_count < 10_000);
            if token.token_type == TokenType::Eos {
                break;
            }
        }
    }
}
