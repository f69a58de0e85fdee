#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Level {
    Info,
    Success,
    Warning,
    Error,
}

impl Level {
    pub fn css_class(&self) -> &'static str {
        match self {
            Level::Info => "info",
            Level::Success => "success",
            Level::Warning => "warning",
            Level::Error => "error",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Notification {
    pub level: Level,
    pub message: String,
}

/// Messages collected while handling one request, rendered once at the end.
#[derive(Debug, Default)]
pub struct Notifications {
    items: Vec<Notification>,
}

impl Notifications {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, level: Level, message: impl Into<String>) {
        self.items.push(Notification {
            level,
            message: message.into(),
        });
    }

    pub fn info(&mut self, message: impl Into<String>) {
        self.push(Level::Info, message)
    }

    pub fn success(&mut self, message: impl Into<String>) {
        self.push(Level::Success, message)
    }

    pub fn warning(&mut self, message: impl Into<String>) {
        self.push(Level::Warning, message)
    }

    pub fn error(&mut self, message: impl Into<String>) {
        self.push(Level::Error, message)
    }

    pub fn count(&self, level: Level) -> usize {
        self.items.iter().filter(|n| n.level == level).count()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Notification> {
        self.items.iter()
    }

    pub fn into_vec(self) -> Vec<Notification> {
        self.items
    }
}
