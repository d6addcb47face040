/// Group numeric digits to facilitate reading long numbers
pub fn group_digits<F: std::fmt::Display>(n: F) -> String {
    use numsep::{separate, Locale};
    separate(n, Locale::English)
}

pub mod timing {

    use super::group_digits;
    use std::time::Instant;

    /// Reports, at `debug` level, how long successive steps took.
    pub struct Progress {
        previous: Instant,
        message: String,
    }

    impl Progress {

        #[allow(clippy::new_without_default)]
        pub fn new() -> Self { Self { previous: Instant::now(), message: String::new() } }

        /// Log message, start timer.
        pub fn start(&mut self, message: impl Into<String>) {
            self.message = message.into();
            log::debug!("{} ...", self.message);
            self.start_timer();
        }

        /// Log the message of the last `start` followed by the time elapsed since
        /// then
        pub fn done(&mut self) {
            log::debug!("{}: {} ms", self.message, group_digits(self.previous.elapsed().as_millis()));
            self.start_timer();
        }

        fn start_timer(&mut self) { self.previous = Instant::now() }
    }
}
