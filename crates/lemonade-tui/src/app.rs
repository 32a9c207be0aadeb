use lemonade_core::{ChatMessage, Config, SessionController, SessionEvent, SessionPhase};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InputMode {
    Normal,
    Editing,
}

pub struct App {
    pub should_quit: bool,
    pub input_mode: InputMode,

    pub session: SessionController,

    // Chat input line
    pub chat_input: String,
    pub chat_cursor: usize, // in chars, not bytes

    // Transcript viewport
    pub chat_scroll: u16,
    pub chat_height: u16, // inner height, updated during render
    pub chat_width: u16,  // inner width, updated during render
    seen_messages: usize,

    pub show_address_input: bool,

    pub animation_frame: u8, // 0-2 for ellipsis animation
}

impl App {
    /// Starts probing the configured server immediately
    pub fn new(config: Config) -> Self {
        Self {
            should_quit: false,
            input_mode: InputMode::Normal,
            session: SessionController::new(config),
            chat_input: String::new(),
            chat_cursor: 0,
            chat_scroll: 0,
            chat_height: 0,
            chat_width: 0,
            seen_messages: 0,
            show_address_input: false,
            animation_frame: 0,
        }
    }

    pub fn phase(&self) -> SessionPhase {
        self.session.phase()
    }

    pub fn on_session_event(&mut self, event: SessionEvent) {
        self.session.apply(event);
        self.after_session_change();
    }

    /// Keep the view consistent with whatever the session just did
    pub fn after_session_change(&mut self) {
        if self.phase() != SessionPhase::ChatReady {
            self.input_mode = InputMode::Normal;
        }

        let count = self.session.transcript().len();
        if count < self.seen_messages {
            self.chat_scroll = 0;
        }
        if count != self.seen_messages || self.session.is_pending() {
            self.scroll_chat_to_bottom();
        }
        self.seen_messages = count;
    }

    pub fn tick_animation(&mut self) {
        if self.session.is_pending() || self.phase() == SessionPhase::Connecting {
            self.animation_frame = (self.animation_frame + 1) % 3;
        }
    }

    // Chat input

    pub fn submit_chat(&mut self) {
        if self.session.send_message(&self.chat_input) {
            self.chat_input.clear();
            self.chat_cursor = 0;
            self.input_mode = InputMode::Normal;
        }
        self.after_session_change();
    }

    pub fn insert_char(&mut self, c: char) {
        let byte_pos = char_to_byte_index(&self.chat_input, self.chat_cursor);
        self.chat_input.insert(byte_pos, c);
        self.chat_cursor += 1;
    }

    pub fn delete_char_before_cursor(&mut self) {
        if self.chat_cursor > 0 {
            self.chat_cursor -= 1;
            let byte_pos = char_to_byte_index(&self.chat_input, self.chat_cursor);
            self.chat_input.remove(byte_pos);
        }
    }

    pub fn delete_char_at_cursor(&mut self) {
        if self.chat_cursor < self.chat_input.chars().count() {
            let byte_pos = char_to_byte_index(&self.chat_input, self.chat_cursor);
            self.chat_input.remove(byte_pos);
        }
    }

    pub fn move_cursor_left(&mut self) {
        self.chat_cursor = self.chat_cursor.saturating_sub(1);
    }

    pub fn move_cursor_right(&mut self) {
        self.chat_cursor = (self.chat_cursor + 1).min(self.chat_input.chars().count());
    }

    pub fn move_cursor_home(&mut self) {
        self.chat_cursor = 0;
    }

    pub fn move_cursor_end(&mut self) {
        self.chat_cursor = self.chat_input.chars().count();
    }

    // Address entry

    pub fn open_address_input(&mut self) {
        let current = self.session.address().to_string();
        self.session.set_address_draft(current);
        self.show_address_input = true;
        self.input_mode = InputMode::Normal;
    }

    pub fn submit_address(&mut self) {
        let draft = self.session.address_draft().to_string();
        self.session.set_address(&draft);
        self.show_address_input = false;
        self.after_session_change();
    }

    pub fn retry(&mut self) {
        self.session.retry();
        self.show_address_input = false;
        self.after_session_change();
    }

    pub fn reset(&mut self) {
        self.session.reset_conversation();
        self.after_session_change();
    }

    // Scrolling

    pub fn scroll_down(&mut self, lines: u16) {
        let max = self.max_scroll();
        self.chat_scroll = self.chat_scroll.saturating_add(lines).min(max);
    }

    pub fn scroll_up(&mut self, lines: u16) {
        self.chat_scroll = self.chat_scroll.saturating_sub(lines);
    }

    pub fn half_page(&self) -> u16 {
        (self.chat_height / 2).max(1)
    }

    pub fn scroll_chat_to_bottom(&mut self) {
        self.chat_scroll = self.max_scroll();
    }

    fn max_scroll(&self) -> u16 {
        let wrap_width = if self.chat_width > 0 { self.chat_width as usize } else { 50 };
        let visible_height = if self.chat_height > 0 { self.chat_height } else { 20 };
        let total = transcript_line_count(
            self.session.transcript(),
            wrap_width,
            self.session.is_pending(),
        );
        total.saturating_sub(visible_height)
    }
}

/// Convert a character index to a byte index for UTF-8 safe string operations
fn char_to_byte_index(s: &str, char_idx: usize) -> usize {
    s.char_indices()
        .nth(char_idx)
        .map(|(i, _)| i)
        .unwrap_or(s.len())
}

/// Rendered height of the transcript: a role line, the wrapped content and a
/// blank separator per message, plus two lines for the pending indicator.
pub fn transcript_line_count(messages: &[ChatMessage], wrap_width: usize, pending: bool) -> u16 {
    let wrap_width = wrap_width.max(1);
    let mut total: usize = 0;

    for msg in messages {
        total += 1;
        for line in msg.content.lines() {
            // Word wrap can spill into one extra row
            total += line.chars().count() / wrap_width + 1;
        }
        total += 1;
    }

    if pending {
        total += 2;
    }

    total.min(u16::MAX as usize) as u16
}
