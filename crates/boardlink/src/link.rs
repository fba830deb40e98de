//! The engine facade: public operations over the paced port, mailboxes,
//! game spool and dispatch thread.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};
use std::thread::JoinHandle;
use std::time::Duration;

use boardlink_proto::{commands, LinkMode, VersionTarget};
use boardlink_transport::{HidLink, LinkDriver};
use tracing::debug;

use crate::error::{LinkError, Result};
use crate::mailbox::Mailbox;
use crate::port::PacedPort;
use crate::spool::GameSpool;
use crate::{dispatch, lock};

/// Callback invoked with the FEN placement of every real-time board frame.
pub type BoardCallback = Arc<dyn Fn(&str) + Send + Sync>;

/// Timing knobs of the engine. `Default` gives the device constants.
#[derive(Debug, Clone)]
pub struct LinkConfig {
    /// Minimum spacing between outgoing writes.
    pub write_interval: Duration,
    /// How long a request waits on the generic reply mailbox.
    pub reply_timeout: Duration,
    /// How long a battery query waits on the battery mailbox.
    pub battery_timeout: Duration,
    /// Ceiling on a stored-game transfer.
    pub fetch_timeout: Duration,
    /// Sleep between polls when no data (or no device) is available.
    pub poll_idle: Duration,
}

impl Default for LinkConfig {
    fn default() -> Self {
        Self {
            write_interval: Duration::from_millis(200),
            reply_timeout: Duration::from_secs(1),
            battery_timeout: Duration::from_secs(1),
            fetch_timeout: Duration::from_secs(120),
            poll_idle: Duration::from_millis(10),
        }
    }
}

/// State shared between the facade and the dispatch thread.
pub(crate) struct LinkShared {
    pub(crate) config: LinkConfig,
    pub(crate) port: PacedPort,
    pub(crate) replies: Mailbox,
    pub(crate) battery: Mailbox,
    pub(crate) spool: GameSpool,
    pub(crate) leds: Mutex<[u8; 8]>,
    /// Last mode the caller requested; restored after a reconnect.
    pub(crate) mode: Mutex<LinkMode>,
    pub(crate) callback: Mutex<Option<BoardCallback>>,
    /// Whether the dispatch loop should re-open a dropped connection.
    pub(crate) reconnect: AtomicBool,
    /// Dispatch-thread shutdown flag; cleared exactly once, on teardown.
    pub(crate) running: AtomicBool,
}

/// Driver for one electronic chessboard.
///
/// One engine owns one transport and one background dispatch thread; the
/// thread's lifetime is bound to the engine and is joined on drop. All
/// public operations are callable from any thread. Request/response
/// operations follow one pattern: encode, paced send, await the relevant
/// mailbox. They must not be pipelined (a second query issued before the
/// first reply is consumed can discard that reply).
pub struct BoardLink {
    shared: Arc<LinkShared>,
    reader: Option<JoinHandle<()>>,
}

impl BoardLink {
    /// Build an engine over any transport. The dispatch thread starts
    /// immediately; the transport stays closed until [`connect`](Self::connect).
    pub fn new(driver: Box<dyn LinkDriver>) -> Self {
        Self::with_config(driver, LinkConfig::default())
    }

    /// Build an engine with explicit timing configuration.
    pub fn with_config(driver: Box<dyn LinkDriver>, config: LinkConfig) -> Self {
        let shared = Arc::new(LinkShared {
            port: PacedPort::new(driver, config.write_interval),
            replies: Mailbox::new(config.reply_timeout),
            battery: Mailbox::new(config.battery_timeout),
            spool: GameSpool::new(),
            leds: Mutex::new([0u8; 8]),
            // The board powers up in upload mode.
            mode: Mutex::new(LinkMode::Upload),
            callback: Mutex::new(None),
            reconnect: AtomicBool::new(false),
            running: AtomicBool::new(true),
            config,
        });

        let loop_shared = Arc::clone(&shared);
        let reader = std::thread::spawn(move || dispatch::run(loop_shared));

        Self {
            shared,
            reader: Some(reader),
        }
    }

    /// Build an engine over the production HID transport.
    pub fn open_hid() -> Result<Self> {
        Ok(Self::new(Box::new(HidLink::new()?)))
    }

    /// Open the board and arm auto-reconnection.
    ///
    /// Reconnection stays armed even if this attempt fails: the dispatch
    /// loop keeps retrying until the board shows up or
    /// [`disconnect`](Self::disconnect) is called.
    pub fn connect(&self) -> Result<()> {
        self.shared.reconnect.store(true, Ordering::SeqCst);
        self.shared.port.connect()
    }

    /// Close the board and disarm auto-reconnection.
    pub fn disconnect(&self) {
        self.shared.reconnect.store(false, Ordering::SeqCst);
        self.shared.port.disconnect();
    }

    pub fn is_connected(&self) -> bool {
        self.shared.port.is_connected()
    }

    /// Switch to real-time mode: every placement change is delivered to
    /// the registered callback.
    pub fn switch_real_time_mode(&self) -> Result<()> {
        self.set_mode(LinkMode::RealTime)
    }

    /// Switch to upload mode, required for stored-game retrieval. The
    /// real-time callback is suppressed in this mode.
    pub fn switch_upload_mode(&self) -> Result<()> {
        self.set_mode(LinkMode::Upload)
    }

    /// Record the requested mode and, when connected, tell the board.
    /// While disconnected the mode is applied on the next reconnect.
    fn set_mode(&self, mode: LinkMode) -> Result<()> {
        *lock(&self.shared.mode) = mode;
        if self.shared.port.is_connected() {
            self.send_command(&commands::switch_mode(mode))?;
        }
        Ok(())
    }

    /// Register the real-time callback, replacing any previous one.
    pub fn set_board_callback(&self, callback: impl Fn(&str) + Send + Sync + 'static) {
        *lock(&self.shared.callback) = Some(Arc::new(callback));
    }

    pub fn clear_board_callback(&self) {
        *lock(&self.shared.callback) = None;
    }

    /// Sound the buzzer: frequency in hertz, duration in milliseconds.
    pub fn beep(&self, frequency: u16, duration: u16) -> Result<()> {
        self.send_command(&commands::beep(frequency, duration))
    }

    /// Replace the whole LED grid. Row 0 is rank 8; bit 7 is file a.
    pub fn set_leds(&self, rows: [u8; 8]) -> Result<()> {
        *lock(&self.shared.leds) = rows;
        self.flush_leds()
    }

    /// Replace the grid from eight `'0'`/`'1'` strings, top row first.
    /// Rejected without any mutation when a row is malformed.
    pub fn set_led_rows(&self, rows: [&str; 8]) -> Result<()> {
        let mut parsed = [0u8; 8];
        for (row, text) in parsed.iter_mut().zip(rows) {
            *row = commands::parse_led_row(text)?;
        }
        self.set_leds(parsed)
    }

    /// Set one cell, merging it into the held grid. `x` is the row index
    /// (0 = rank 8), `y` the bit index within the row.
    pub fn set_led(&self, x: u8, y: u8, on: bool) -> Result<()> {
        if x > 7 || y > 7 {
            return Err(LinkError::LedCellOutOfRange(x, y));
        }
        {
            let mut leds = lock(&self.shared.leds);
            if on {
                leds[x as usize] |= 1 << y;
            } else {
                leds[x as usize] &= !(1 << y);
            }
        }
        self.flush_leds()
    }

    /// The grid as last requested.
    pub fn led_state(&self) -> [u8; 8] {
        *lock(&self.shared.leds)
    }

    fn flush_leds(&self) -> Result<()> {
        let rows = *lock(&self.shared.leds);
        self.send_command(&commands::set_leds(&rows))
    }

    /// Main-microcontroller firmware version. Empty if the board did not
    /// answer in time.
    pub fn mcu_version(&self) -> Result<String> {
        self.version(VersionTarget::Mcu)
    }

    /// Bluetooth-controller firmware version. Empty if the board did not
    /// answer in time.
    pub fn ble_version(&self) -> Result<String> {
        self.version(VersionTarget::Ble)
    }

    fn version(&self, target: VersionTarget) -> Result<String> {
        self.send_command(&commands::version_query(target))?;
        let reply = self.shared.replies.recv();
        // Version replies carry a 3-byte header before the text.
        if reply.len() > 3 {
            Ok(String::from_utf8_lossy(&reply[3..]).into_owned())
        } else {
            Ok(String::new())
        }
    }

    /// Battery level in percent. Zero if the board did not answer in time.
    pub fn battery_level(&self) -> Result<u8> {
        self.send_command(&commands::battery_query())?;
        let reply = self.shared.battery.recv();
        Ok(reply.get(2).copied().unwrap_or(0))
    }

    /// Number of games in on-board storage. Zero if the board did not
    /// answer in time.
    pub fn stored_game_count(&self) -> Result<u8> {
        self.send_command(&commands::file_count_query())?;
        let reply = self.shared.replies.recv();
        Ok(reply.get(2).copied().unwrap_or(0))
    }

    /// Retrieve the stored game at the head of on-board storage as a FEN
    /// sequence, switching the board to upload mode.
    ///
    /// With `delete` set, the game is removed after a successful transfer,
    /// so repeated calls drain the store one game per call and then return
    /// empty. Without `delete`, every call re-fetches the same head game.
    /// A transfer that does not complete within the configured ceiling
    /// returns empty.
    pub fn fetch_stored_game(&self, delete: bool) -> Result<Vec<String>> {
        if self.stored_game_count()? == 0 {
            return Ok(Vec::new());
        }

        self.switch_upload_mode()?;

        // Snapshot before the transfer commands so a transfer that
        // completes before we start waiting is still observed.
        let since = self.shared.spool.generation();
        self.send_command(&commands::file_list_begin())?;
        self.send_command(&commands::file_list_confirm())?;

        match self
            .shared
            .spool
            .wait_complete(since, self.shared.config.fetch_timeout)
        {
            Some(game) => {
                if delete {
                    self.send_command(&commands::delete_current_file())?;
                }
                Ok(game)
            }
            None => {
                debug!("stored game transfer timed out");
                Ok(Vec::new())
            }
        }
    }

    fn send_command(&self, frame: &[u8]) -> Result<()> {
        let written = self.shared.port.send(frame)?;
        if written == 0 {
            return Err(LinkError::WriteRejected);
        }
        Ok(())
    }
}

impl Drop for BoardLink {
    fn drop(&mut self) {
        self.shared.running.store(false, Ordering::SeqCst);
        self.shared.reconnect.store(false, Ordering::SeqCst);
        if let Some(reader) = self.reader.take() {
            let _ = reader.join();
        }
        self.shared.port.disconnect();
    }
}
