use colored::*;
use std::io::Write;
use std::time::{Duration, SystemTime, UNIX_EPOCH};

const BOOT_MESSAGES: [&str; 8] = [
    "👻 Manifesting the ghost in your shell...",
    "🌌 Disconnecting tethers to reality...",
    "🧠 Loading neural pathways...",
    "⚡ Charging ether substrate...",
    "🔮 Initializing quantum entanglement...",
    "💫 Bootstrapping consciousness matrix...",
    "🌀 Spinning up AI cortex...",
    "✨ Weaving reality distortion field...",
];

const SPLASH_LINES: usize = 3;
const SPLASH_DELAY: Duration = Duration::from_millis(300);

/// Three distinct messages chosen from `seed`
pub fn pick_messages(seed: u64) -> Vec<&'static str> {
    let count = BOOT_MESSAGES.len();
    let start = (seed % count as u64) as usize;
    // 3 is coprime with 8, so the stride never revisits a message
    (0..SPLASH_LINES)
        .map(|i| BOOT_MESSAGES[(start + i * 3) % count])
        .collect()
}

pub async fn show_boot_splash() {
    let seed = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_millis() as u64)
        .unwrap_or(0);

    for message in pick_messages(seed) {
        println!("{}", message.dimmed());
        let _ = std::io::stdout().flush();
        tokio::time::sleep(SPLASH_DELAY).await;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    #[test]
    fn test_messages_are_distinct_for_every_seed() {
        for seed in 0..16 {
            let picked = pick_messages(seed);
            assert_eq!(picked.len(), 3);
            let unique: HashSet<_> = picked.iter().collect();
            assert_eq!(unique.len(), 3, "seed {}", seed);
        }
    }

    #[test]
    fn test_seed_rotates_choice() {
        assert_ne!(pick_messages(0), pick_messages(1));
        assert_eq!(pick_messages(2), pick_messages(10));
    }
}
