//! Verify command - enters the login code and stores the session token.

use crate::commands::{CommandHandler, Site};
use crate::error::{AppError, AppResult};
use async_trait::async_trait;
use chanterelle_portal::{
    AutoSubmit, CodeEntry, CodeEntryOptions, Focus, InputEffect, SubmitOutcome, CODE_LENGTH,
};
use tokio::io::{AsyncBufRead, AsyncBufReadExt};
use tokio::sync::Mutex;

type Input = Box<dyn AsyncBufRead + Send + Unpin>;

pub struct VerifyHandler {
    code: Option<String>,
    auto_submit: bool,
    input: Mutex<Input>,
}

impl VerifyHandler {
    /// `input` supplies digits and the confirmation when no code is given.
    pub fn new(code: Option<String>, auto_submit: bool, input: Input) -> Self {
        Self {
            code,
            auto_submit,
            input: Mutex::new(input),
        }
    }

    async fn prompt(&self, text: &str) -> AppResult<String> {
        eprint!("{text}");
        let mut line = String::new();
        let read = self.input.lock().await.read_line(&mut line).await?;
        if read == 0 {
            return Err(AppError::Rejected("Input closed before the code was complete".into()));
        }
        Ok(line.trim().to_string())
    }

    /// Prompt position by position until every digit is in.
    async fn type_code(&self, entry: &CodeEntry) -> AppResult<bool> {
        let mut focus = Focus::Digit(0);
        loop {
            let Focus::Digit(index) = focus else {
                return Ok(false);
            };

            let text = self
                .prompt(&format!("Digit {}/{}: ", index + 1, CODE_LENGTH))
                .await?;

            // a whole code typed at once counts as a paste
            let effect = if text.chars().count() == CODE_LENGTH {
                entry.paste(index, &text)
            } else {
                entry.enter(index, &text)
            };

            match effect {
                InputEffect::Complete { submit_now } => return Ok(submit_now),
                InputEffect::Filled { focus: next } => focus = next,
                InputEffect::Ignored => eprintln!("Enter a single digit"),
            }
        }
    }
}

#[async_trait]
impl CommandHandler for VerifyHandler {
    fn name(&self) -> &str {
        "verify"
    }

    async fn execute(&self, site: &Site) -> AppResult<String> {
        let options = CodeEntryOptions {
            validation: site.code_validation,
            auto_submit: if self.auto_submit {
                AutoSubmit::On
            } else {
                AutoSubmit::Off
            },
        };
        let entry = CodeEntry::new(site.client.clone(), site.session.clone(), options);

        match self.code.as_deref() {
            Some(code) => {
                if entry.paste(0, code) == InputEffect::Ignored {
                    return Err(AppError::Rejected(
                        "Verification code must be 6 digits".into(),
                    ));
                }
            }
            None => {
                let submit_now = self.type_code(&entry).await?;
                if !submit_now {
                    let answer = self
                        .prompt(&format!("Submit {}? [Y/n] ", entry.snapshot().code()))
                        .await?;
                    if answer.eq_ignore_ascii_case("n") || answer.eq_ignore_ascii_case("no") {
                        return Ok("Code not submitted.".into());
                    }
                }
            }
        }

        match entry.submit().await? {
            SubmitOutcome::Authenticated(next) => {
                Ok(format!("Signed in. Run `chanterelle contacts` ({next})."))
            }
            SubmitOutcome::Failed(message) => Err(AppError::Rejected(message)),
            SubmitOutcome::Disabled => Err(AppError::Rejected(
                "Verification code must be 6 digits".into(),
            )),
            SubmitOutcome::Ignored => Err(AppError::Rejected(
                "A verification is already in progress".into(),
            )),
        }
    }
}
