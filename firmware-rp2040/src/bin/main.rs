#![no_std]
#![no_main]

use defmt::{error, info, warn};
use defmt_rtt as _;
use embassy_executor::{InterruptExecutor, Spawner};
use embassy_rp::bind_interrupts;
use embassy_rp::gpio::{Level, Output};
use embassy_rp::interrupt;
use embassy_rp::interrupt::{InterruptExt, Priority};
use embassy_rp::peripherals::UART1;
use embassy_rp::uart::{Config as UartConfig, Uart};
use embassy_time::{Delay, Duration, Ticker};
use ibus_audio_rp2040::{
    AudioBridge, AudioPlayer, IbusInput, IbusUartReceiver, RingBuffer, UartCommandSink,
    IBUS_BAUDRATE, PROFILE, RX_BUFFER_SIZE,
};
use portable_atomic::{AtomicU32, Ordering};
use static_cell::StaticCell;

#[cfg(feature = "dev-panic")]
use panic_probe as _;
#[cfg(feature = "prod-panic")]
use panic_reset as _;

bind_interrupts!(struct Irqs {
    UART1_IRQ => embassy_rp::uart::InterruptHandler<UART1>;
});

/// Executor for the receiver task; preempts the thread-mode main loop.
static EXECUTOR_HIGH: InterruptExecutor = InterruptExecutor::new();

#[interrupt]
unsafe fn SWI_IRQ_1() {
    EXECUTOR_HIGH.on_interrupt()
}

/// Receive ring buffer shared by the receiver task and the main loop.
static RX_RING: StaticCell<RingBuffer<RX_BUFFER_SIZE>> = StaticCell::new();

/// Bytes dropped because the ring buffer was full.
static RX_DROPPED: AtomicU32 = AtomicU32::new(0);

#[embassy_executor::main]
async fn main(spawner: Spawner) {
    info!("i-Bus audio bridge starting (profile: {})", PROFILE.name);

    let p = embassy_rp::init(embassy_rp::config::Config::default());

    // --- UART Setup ---
    let mut uart_config = UartConfig::default();
    uart_config.baudrate = IBUS_BAUDRATE;

    let uart = Uart::new(
        p.UART1,
        p.PIN_8, // TX
        p.PIN_9, // RX
        Irqs,
        p.DMA_CH0,
        p.DMA_CH1,
        uart_config,
    );
    let (tx, rx) = uart.split();

    // --- Receive path ---
    let ring = RX_RING.init(RingBuffer::new());
    let (producer, consumer) = ring.split();

    interrupt::SWI_IRQ_1.set_priority(Priority::P2);
    let high_spawner = EXECUTOR_HIGH.start(interrupt::SWI_IRQ_1);
    high_spawner
        .spawn(rx_task(IbusUartReceiver::new(rx, producer, &RX_DROPPED)))
        .unwrap();

    // On-board LED for overflow indication
    let led = Output::new(p.PIN_25, Level::Low);
    spawner.spawn(health_task(led)).unwrap();

    // --- Audio module ---
    let mut player = AudioPlayer::new(UartCommandSink::new(tx));
    let mut delay = Delay;

    if let Err(e) = player.startup(&PROFILE.startup, &mut delay).await {
        error!("Startup sequence error: {:?}", e);
    }

    #[cfg(feature = "diagnostics")]
    {
        use embassy_rp::gpio::{Input, Pull};
        use ibus_audio_rp2040::ReplyReceiver;

        let mut reply = ReplyReceiver::new(Input::new(p.PIN_10, Pull::Up), Delay);
        match player.total_files(&mut reply).await {
            Ok(0) => warn!("Audio module did not report any files"),
            Ok(count) => info!("Audio module reports {} files", count),
            Err(e) => error!("File count query error: {:?}", e),
        }
    }

    let mut bridge = AudioBridge::new(IbusInput::new(consumer), player, delay, PROFILE.bindings);

    info!("i-Bus audio bridge initialized, watching channels...");
    bridge.run().await
}

/// Receiver task - moves UART bytes into the ring buffer.
#[embassy_executor::task]
async fn rx_task(mut receiver: IbusUartReceiver<'static>) {
    receiver.run().await
}

/// Health task - reports receive overflow once per second.
#[embassy_executor::task]
async fn health_task(mut led: Output<'static>) {
    let mut ticker = Ticker::every(Duration::from_secs(1));
    let mut reported = 0;

    loop {
        ticker.next().await;

        let dropped = RX_DROPPED.load(Ordering::Relaxed);
        if dropped != reported {
            warn!(
                "i-Bus receive buffer overflow: {} bytes dropped",
                dropped.wrapping_sub(reported)
            );
            reported = dropped;
            // Toggle LED to indicate overflow
            led.toggle();
        }
    }
}
