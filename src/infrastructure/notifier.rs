use serde::Serialize;
use std::sync::Mutex;

#[derive(Debug, Clone, Copy, Serialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum NoticeLevel {
    Warning,
    Success,
    Error,
    Reminder,
}

/// User-facing notice queued for the shell to render (modal, toast or alert).
#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
pub struct Notice {
    pub level: NoticeLevel,
    pub message: String,
}

impl Notice {
    pub fn warning(message: impl Into<String>) -> Self {
        Self {
            level: NoticeLevel::Warning,
            message: message.into(),
        }
    }

    pub fn success(message: impl Into<String>) -> Self {
        Self {
            level: NoticeLevel::Success,
            message: message.into(),
        }
    }

    pub fn error(message: impl Into<String>) -> Self {
        Self {
            level: NoticeLevel::Error,
            message: message.into(),
        }
    }

    pub fn reminder(supplement_name: &str) -> Self {
        Self {
            level: NoticeLevel::Reminder,
            message: format!("Time to take {supplement_name}!"),
        }
    }
}

#[derive(Debug, Default)]
pub struct InMemoryNotificationCenter {
    notices: Mutex<Vec<Notice>>,
}

impl InMemoryNotificationCenter {
    pub fn push(&self, notice: Notice) {
        // A poisoned queue only loses the notice; it never fails the command
        // that produced it.
        if let Ok(mut guard) = self.notices.lock() {
            guard.push(notice);
        }
    }

    pub fn drain(&self) -> Vec<Notice> {
        match self.notices.lock() {
            Ok(mut guard) => std::mem::take(&mut *guard),
            Err(_) => Vec::new(),
        }
    }

    pub fn pending(&self) -> usize {
        self.notices.lock().map(|guard| guard.len()).unwrap_or(0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn drain_returns_notices_in_push_order_and_empties_queue() {
        let center = InMemoryNotificationCenter::default();
        center.push(Notice::warning("enter supplement name."));
        center.push(Notice::reminder("VitaminD"));

        let drained = center.drain();
        assert_eq!(drained.len(), 2);
        assert_eq!(drained[0].level, NoticeLevel::Warning);
        assert_eq!(drained[1].message, "Time to take VitaminD!");
        assert_eq!(center.pending(), 0);
    }
}
