// Example: Driving the metronome on a virtual clock
// This shows the event loop a front end runs, without a sound card

use std::sync::{Arc, Mutex};
use std::time::Duration;

use pulse_metronome::{
    Clock, ManualClock, Metronome, RecordingOutput, Subdivision, create_notification_channel,
};

fn main() -> pulse_metronome::Result<()> {
    // One clock serves as wall clock and audio clock
    let clock = ManualClock::new();
    let output = RecordingOutput::new(clock.clone());
    let (notification_tx, _notification_rx) = create_notification_channel(16);

    let mut metronome = Metronome::new(
        Box::new(output.clone()),
        Box::new(clock.clone()),
        Arc::new(Mutex::new(notification_tx)),
    );

    // Configure musical context
    metronome.set_tempo(120);
    metronome.set_time_signature(3, 4);
    metronome.set_subdivision(Subdivision::Triplet);

    metronome.start()?;

    println!("Simulating 2 seconds at 120 BPM, triplets");
    println!("Pattern: Accent on each beat, two light clicks in between\n");

    // A real front end sleeps for `time_until_next()` instead of jumping
    let end = Duration::from_secs(2);
    while clock.now() < end {
        metronome.poll();
        match metronome.next_due() {
            Some(due) => clock.set(due.min(end)),
            None => break,
        }
    }
    metronome.stop();

    for click in output.clicks() {
        println!(
            "{:>8.3}s  {}{}",
            click.time,
            click.sound,
            if click.accent { "  ACCENT" } else { "" }
        );
    }
    println!("\n{} clicks scheduled", output.click_count());

    Ok(())
}
