// src/progress.rs
/// Lightweight progress reporting for a run.
/// The CLI implements this to print one line per character.
pub trait Progress {
    /// Called at the start with the number of characters.
    fn begin(&mut self, _total: usize) {}

    /// A character was fetched; `detail` is already formatted.
    fn item_done(&mut self, _name: &str, _detail: &str) {}

    /// A character could not be fetched.
    fn item_failed(&mut self, _name: &str, _reason: &str) {}

    /// Called at the end of fetching, successful or not.
    fn finish(&mut self) {}
}

/// Prints to stdout, one line per event.
pub struct ConsoleProgress {
    total: usize,
    seen: usize,
}

impl ConsoleProgress {
    pub fn new() -> Self { Self { total: 0, seen: 0 } }
}

impl Default for ConsoleProgress {
    fn default() -> Self { Self::new() }
}

impl Progress for ConsoleProgress {
    fn begin(&mut self, total: usize) {
        self.total = total;
        self.seen = 0;
        println!("🔍 Fetching XP for {total} characters…");
    }

    fn item_done(&mut self, name: &str, detail: &str) {
        self.seen += 1;
        println!("[{}/{}] ✅ {name}: {detail}", self.seen, self.total);
    }

    fn item_failed(&mut self, name: &str, reason: &str) {
        self.seen += 1;
        println!("[{}/{}] ❌ {name}: {reason}", self.seen, self.total);
    }
}
