use lettre::message::{Mailbox, Message};
use lettre::{SmtpTransport, Transport};
use maildrop::{Address, MailStore, MemoryStore, ServerConfig, SmtpServer};
use std::error::Error;
use std::net::TcpListener;
use std::sync::Arc;
use std::thread;
use std::time::{Duration, Instant};

#[test]
fn basic_lettre_send() -> Result<(), Box<dyn Error>> {
    let listener = TcpListener::bind("127.0.0.1:0")?;
    let port = listener.local_addr()?.port();
    let config = ServerConfig {
        hostname: "localhost".to_string(),
        domain: "example.com".to_string(),
        mailboxes: vec!["tarou".to_string()],
        ..ServerConfig::default()
    };
    let store = Arc::new(MemoryStore::new());
    let server = SmtpServer::new(config, store.clone())?;

    thread::spawn(move || {
        server
            .start_with_listener(listener)
            .expect("server start failed")
    });

    let message = Message::builder()
        .from("花子 <hanako@example.com>".parse::<Mailbox>()?)
        .to("太郎 <tarou@example.com>".parse::<Mailbox>()?)
        .subject("Greetings")
        .body("本文".to_owned())?;

    let mailer = SmtpTransport::builder_dangerous("127.0.0.1")
        .port(port)
        .build();

    mailer.send(&message)?;

    let tarou = Address::new("tarou", "example.com");
    let deadline = Instant::now() + Duration::from_secs(2);
    let mail = loop {
        let mail = store.list_mail(&tarou)?;
        if !mail.is_empty() || Instant::now() > deadline {
            break mail;
        }
        thread::sleep(Duration::from_millis(10));
    };

    assert_eq!(mail.len(), 1);
    assert_eq!(mail[0].from, Address::new("hanako", "example.com"));
    assert_eq!(mail[0].to, vec![tarou]);
    assert_eq!(mail[0].subject, "Greetings");

    Ok(())
}
