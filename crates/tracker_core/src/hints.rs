use std::time::Duration;

pub const HINT_INTERVAL: Duration = Duration::from_millis(6000);

pub const DEFAULT_HINTS: [&str; 4] = [
    "正在分析页面内容...",
    "正在识别文字区域...",
    "正在还原版式与字体...",
    "即将完成，请稍候...",
];

/// Cycles through cosmetic status strings.
///
/// Independent of the job's reported stage.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StageHintRotator {
    hints: Vec<String>,
    index: usize,
    active: bool,
}

impl StageHintRotator {
    /// An empty list falls back to [`DEFAULT_HINTS`].
    pub fn new(hints: Vec<String>) -> Self {
        let hints = if hints.is_empty() {
            DEFAULT_HINTS.iter().map(|hint| hint.to_string()).collect()
        } else {
            hints
        };
        Self {
            hints,
            index: 0,
            active: false,
        }
    }

    pub fn start(&mut self) {
        self.index = 0;
        self.active = true;
    }

    pub fn stop(&mut self) {
        self.active = false;
    }

    pub fn tick(&mut self) {
        if self.active {
            self.index = (self.index + 1) % self.hints.len();
        }
    }

    pub fn is_active(&self) -> bool {
        self.active
    }

    pub fn index(&self) -> usize {
        self.index
    }

    pub fn current(&self) -> &str {
        &self.hints[self.index]
    }

    pub fn len(&self) -> usize {
        self.hints.len()
    }

    pub fn is_empty(&self) -> bool {
        self.hints.is_empty()
    }
}

impl Default for StageHintRotator {
    fn default() -> Self {
        Self::new(Vec::new())
    }
}
