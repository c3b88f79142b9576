//! Chronologically sortable push keys.
//!
//! 8 characters of millisecond timestamp followed by 12 random characters,
//! all drawn from an alphabet whose ASCII order matches its digit value.

use std::sync::Mutex;

use crate::model::Millis;

const PUSH_CHARS: &[u8; 64] = b"-0123456789ABCDEFGHIJKLMNOPQRSTUVWXYZ_abcdefghijklmnopqrstuvwxyz";

const RANDOM_LEN: usize = 12;

#[derive(Debug, Default)]
struct State {
    last_millis: Millis,
    last_random: [u8; RANDOM_LEN],
}

/// Generator of unique push keys.
///
/// Keys from one generator are strictly increasing: within the same
/// millisecond the random suffix is incremented instead of redrawn.
#[derive(Debug, Default)]
pub struct PushIdGenerator {
    state: Mutex<State>,
}

impl PushIdGenerator {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Next key for a write happening at `now`.
    pub fn next_id(&self, now: Millis) -> String {
        let mut state = match self.state.lock() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        };

        if now == state.last_millis {
            increment(&mut state.last_random);
        } else {
            state.last_millis = now;
            state.last_random = rand::random::<[u8; RANDOM_LEN]>().map(|byte| byte % 64);
        }

        let mut key = Vec::with_capacity(8 + RANDOM_LEN);
        let mut ts = now.max(0);
        let mut ts_chars = [0u8; 8];
        for slot in ts_chars.iter_mut().rev() {
            *slot = PUSH_CHARS[usize::try_from(ts % 64).unwrap_or(0)];
            ts /= 64;
        }
        key.extend_from_slice(&ts_chars);
        key.extend(state.last_random.iter().map(|&d| PUSH_CHARS[usize::from(d)]));

        String::from_utf8(key).unwrap_or_default()
    }
}

fn increment(digits: &mut [u8; RANDOM_LEN]) {
    for digit in digits.iter_mut().rev() {
        if *digit == 63 {
            *digit = 0;
        } else {
            *digit += 1;
            return;
        }
    }
}
