//! Line parsing for the interactive quiz and chat consoles

/// A line typed during a quiz
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum QuizInput {
    /// Pick an option, zero-based
    Answer(usize),
    /// Go to the next question
    Next,
    /// Start the quiz over
    Restart,
    /// Leave the quiz
    Quit,
    /// Show help
    Help,
}

/// A line typed in the assistant chat
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ChatInput {
    /// Text to send to the assistant
    Message(String),
    /// Reset the conversation: /clear
    Clear,
    /// Leave the chat: /quit or /q
    Quit,
    /// Show help: /help
    Help,
    /// Blank line
    Nop,
}

/// Result of parsing a line
#[derive(Debug, PartialEq, Eq)]
pub enum ParseResult<T> {
    /// Successfully parsed
    Ok(T),
    /// Unknown command
    UnknownCommand(String),
}

/// Parse a quiz line; options are typed 1 to `option_count`
pub fn parse_quiz_input(input: &str, option_count: usize) -> ParseResult<QuizInput> {
    let input = input.trim();

    if let Ok(n) = input.parse::<usize>() {
        return if (1..=option_count).contains(&n) {
            ParseResult::Ok(QuizInput::Answer(n - 1))
        } else {
            ParseResult::UnknownCommand(input.to_string())
        };
    }

    // a, b, c, d also pick options
    if let [letter] = input.to_lowercase().as_bytes() {
        if letter.is_ascii_lowercase() {
            let index = usize::from(letter - b'a');
            if index < option_count {
                return ParseResult::Ok(QuizInput::Answer(index));
            }
        }
    }

    match input.to_lowercase().as_str() {
        "" | "n" | "next" => ParseResult::Ok(QuizInput::Next),
        "r" | "restart" => ParseResult::Ok(QuizInput::Restart),
        "q" | "quit" | "exit" => ParseResult::Ok(QuizInput::Quit),
        "h" | "?" | "help" => ParseResult::Ok(QuizInput::Help),
        other => ParseResult::UnknownCommand(other.to_string()),
    }
}

/// Parse a chat line; commands start with `/`
pub fn parse_chat_input(input: &str) -> ParseResult<ChatInput> {
    let input = input.trim();

    if input.is_empty() {
        return ParseResult::Ok(ChatInput::Nop);
    }

    let Some(command) = input.strip_prefix('/') else {
        return ParseResult::Ok(ChatInput::Message(input.to_string()));
    };

    let cmd = command.split_whitespace().next().unwrap_or("");
    match cmd.to_lowercase().as_str() {
        "clear" | "c" => ParseResult::Ok(ChatInput::Clear),
        "quit" | "q" | "exit" => ParseResult::Ok(ChatInput::Quit),
        "help" | "h" => ParseResult::Ok(ChatInput::Help),
        other => ParseResult::UnknownCommand(other.to_string()),
    }
}
