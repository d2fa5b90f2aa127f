//! Human-like pauses and scrolling between page interactions.

use std::ops::RangeInclusive;
use std::time::Duration;

use rand::Rng;
use shelfscan_core::ScraperSettings;

use crate::driver::PageDriver;
use crate::error::ScraperError;

const SCROLL_STEP_PX: RangeInclusive<u64> = 200..=500;
const SCROLL_PAUSE: (Duration, Duration) = (Duration::from_millis(100), Duration::from_millis(300));

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct HumanPacing {
    min_delay: Duration,
    max_delay: Duration,
    scroll_pause: (Duration, Duration),
}

impl HumanPacing {
    #[must_use]
    pub fn new(min_delay: Duration, max_delay: Duration) -> Self {
        Self {
            min_delay,
            max_delay,
            scroll_pause: SCROLL_PAUSE,
        }
    }

    /// No waiting at all. Scrolling still walks the page.
    #[must_use]
    pub fn none() -> Self {
        Self {
            min_delay: Duration::ZERO,
            max_delay: Duration::ZERO,
            scroll_pause: (Duration::ZERO, Duration::ZERO),
        }
    }

    #[must_use]
    pub fn from_settings(settings: &ScraperSettings) -> Self {
        Self::new(
            Duration::from_secs_f64(settings.min_action_delay),
            Duration::from_secs_f64(settings.max_action_delay),
        )
    }

    /// A uniformly random delay in `[min_delay, max_delay]`.
    #[must_use]
    pub fn action_delay(&self) -> Duration {
        random_between(self.min_delay, self.max_delay)
    }

    /// Sleep for one [`action_delay`](Self::action_delay).
    pub async fn pause(&self) {
        let delay = self.action_delay();
        if !delay.is_zero() {
            tokio::time::sleep(delay).await;
        }
    }

    /// Scroll from the top to the bottom of the page in random steps,
    /// pausing briefly after each one.
    ///
    /// # Errors
    ///
    /// Propagates driver errors from measuring or scrolling the page.
    pub async fn human_scroll(&self, page: &dyn PageDriver) -> Result<(), ScraperError> {
        let height = page.scroll_height().await?;
        let mut y = 0;
        while y < height {
            page.scroll_to(y).await?;
            let pause = random_between(self.scroll_pause.0, self.scroll_pause.1);
            if !pause.is_zero() {
                tokio::time::sleep(pause).await;
            }
            y += scroll_step();
        }
        Ok(())
    }
}

fn scroll_step() -> u64 {
    rand::rng().random_range(SCROLL_STEP_PX)
}

fn random_between(min: Duration, max: Duration) -> Duration {
    if max <= min {
        return min;
    }
    let secs = rand::rng().random_range(min.as_secs_f64()..=max.as_secs_f64());
    Duration::from_secs_f64(secs)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::driver::html::{HtmlPage, PageAction};

    #[test]
    fn action_delay_stays_in_range() {
        let pacing = HumanPacing::new(Duration::from_millis(10), Duration::from_millis(20));
        for _ in 0..100 {
            let delay = pacing.action_delay();
            assert!(delay >= Duration::from_millis(10) && delay <= Duration::from_millis(20));
        }
    }

    #[test]
    fn none_never_waits() {
        assert_eq!(HumanPacing::none().action_delay(), Duration::ZERO);
    }

    #[test]
    fn from_settings_uses_action_delays() {
        let settings = ScraperSettings {
            min_action_delay: 0.5,
            max_action_delay: 0.5,
            ..ScraperSettings::default()
        };
        let pacing = HumanPacing::from_settings(&settings);
        assert_eq!(pacing.action_delay(), Duration::from_millis(500));
    }

    #[tokio::test]
    async fn scroll_walks_to_the_bottom() {
        let page = HtmlPage::new()
            .with_document("https://shop.test/", "<p>x</p>")
            .with_scroll_height(1000);
        page.goto("https://shop.test/").await.unwrap();

        HumanPacing::none().human_scroll(&page).await.unwrap();

        let offsets: Vec<u64> = page
            .actions()
            .into_iter()
            .filter_map(|a| match a {
                PageAction::ScrollTo(y) => Some(y),
                _ => None,
            })
            .collect();
        assert_eq!(offsets.first(), Some(&0));
        assert!(offsets.windows(2).all(|w| {
            let step = w[1] - w[0];
            (200..=500).contains(&step)
        }));
        assert!(offsets.iter().all(|&y| y < 1000));
        assert!(offsets.last().is_some_and(|&y| y + 500 >= 1000));
    }
}
