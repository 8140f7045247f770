use amqp_receiver::config::Config;
use amqp_receiver::driver::{LinkDriver, LinkEvent};
use amqp_receiver::terminus::hex;
use amqp_receiver::transport::memory::MemorySession;
use amqp_receiver::{DeliveryId, Receiver, Result, logging};
use clap::Parser;

// === MAIN FUNCTION ===
#[tokio::main]
async fn main() -> Result<()> {
    let config = Config::parse();
    logging::init(config.debug, config.trace);

    let receiver_config = config.to_receiver_config();
    let mut session = MemorySession::new();
    let mut receiver = Receiver::attach(&mut session, &receiver_config.name, receiver_config.address()?)?;
    receiver.configure()?;

    let filter = receiver.terminus()?.filter().encode()?;
    println!("Receiver {} attached to {} on {}", receiver.name(), receiver.source(), session.id());
    match receiver.subject() {
        Some(subject) => println!("Subject filter '{}': {}", subject, hex(&filter)),
        None => println!("No subject filter"),
    }

    let (tx, handle) = LinkDriver::spawn(receiver);

    let mut events = vec![LinkEvent::SetCapacity(receiver_config.capacity)];
    for _ in 0..config.deliveries {
        events.push(LinkEvent::Incoming);
    }
    for _ in 0..config.consume {
        events.push(LinkEvent::Advance);
    }
    for id in 0..config.settle {
        events.push(LinkEvent::Settle(DeliveryId(id as u64)));
    }
    events.push(LinkEvent::Close);

    for event in events {
        if tx.send(event).is_err() {
            eprintln!("Link driver stopped early");
            break;
        }
    }

    match handle.await {
        Ok(snapshot) => {
            snapshot?.print_summary();
            println!("Live links on session: {}", session.live_links());
            Ok(())
        }
        Err(e) => {
            eprintln!("Task error: {}", e);
            std::process::exit(1);
        }
    }
}
