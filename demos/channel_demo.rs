use rand::Rng;
use std::sync::mpsc::{self, Receiver};
use std::thread;
use std::time::Duration;
use wifiglyph::{
    Color, GlyphConfig, SignalError, SignalSample, SignalSource, WifiSignalView, WindowConfig,
    LEVELS,
};

/// Signal source fed from another thread; keeps the newest reading.
struct ChannelSignal {
    receiver: Receiver<SignalSample>,
    latest: Option<SignalSample>,
}

impl SignalSource for ChannelSignal {
    fn sample(&mut self) -> Result<SignalSample, SignalError> {
        while let Ok(sample) = self.receiver.try_recv() {
            self.latest = Some(sample);
        }
        self.latest.ok_or(SignalError::Unavailable)
    }
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt::init();

    let config = GlyphConfig::builder()
        .fill_color(Color::rgb(0x21, 0x96, 0xf3))
        .background_color(Color::rgba(0x21, 0x96, 0xf3, 60))
        .poll_interval(Duration::from_millis(500))
        .build();

    let (sender, receiver) = mpsc::channel();

    // Feed random readings, dropping the connection now and then
    thread::spawn(move || {
        let mut rng = rand::rng();
        loop {
            let sample = if rng.random_bool(0.15) {
                SignalSample::Disconnected
            } else {
                SignalSample::Level(rng.random_range(0..LEVELS))
            };
            if sender.send(sample).is_err() {
                break;
            }
            thread::sleep(Duration::from_millis(700));
        }
    });

    println!("Displaying a wifi glyph fed by a background thread:");
    println!("- fill follows random levels 0..{}", LEVELS - 1);
    println!("- dropouts strike the glyph through");
    println!("Close the window to exit");

    let source = ChannelSignal {
        receiver,
        latest: None,
    };
    let mut view = WifiSignalView::new(&config, source);
    view.show(&WindowConfig::default())?;
    Ok(())
}
