use latchpool::{BufferFactory, PoolError, SharedBuffer};
use std::io;
use std::sync::Arc;
use std::thread;

fn shared(factory: &BufferFactory) -> SharedBuffer {
    factory.get().with_mutex(factory)
}

#[test]
fn test_safe_operations_on_live_buffer() {
    let factory = BufferFactory::new();
    let buf = shared(&factory);

    assert_eq!(buf.safe_write(b"hello ").unwrap(), 6);
    assert_eq!(buf.safe_write_str("world").unwrap(), 5);
    assert_eq!(buf.safe_len(), 11);
    assert!(buf.safe_cap() >= 11);
    assert_eq!(buf.safe_string(), "hello world");

    assert_eq!(buf.safe_read_byte().unwrap(), Some(b'h'));
    buf.safe_unread_byte().unwrap();
    assert!(matches!(buf.safe_unread_byte(), Err(PoolError::InvalidUnread)));

    assert_eq!(buf.safe_next(6), b"hello ");
    let mut out = [0u8; 3];
    assert_eq!(buf.safe_read(&mut out).unwrap(), 3);
    assert_eq!(&out, b"wor");
    assert_eq!(buf.safe_bytes(), b"ld");

    buf.safe_truncate(1).unwrap();
    assert_eq!(buf.safe_bytes(), b"l");
    buf.safe_reset().unwrap();
    assert_eq!(buf.safe_len(), 0);
}

#[test]
fn test_safe_io() {
    let factory = BufferFactory::new();
    let buf = shared(&factory);

    let n = buf.safe_read_from(&mut io::Cursor::new(b"piped".to_vec())).unwrap();
    assert_eq!(n, 5);

    let mut sink = Vec::new();
    assert_eq!(buf.safe_write_to(&mut sink).unwrap(), 5);
    assert_eq!(sink, b"piped");
    assert_eq!(buf.safe_len(), 0);
}

#[test]
fn test_safe_put_and_close_race_once() {
    let factory = BufferFactory::new();
    let buf = shared(&factory);
    buf.safe_write_str("once").unwrap();

    assert!(factory.safe_put(&buf).is_ok());
    assert!(matches!(factory.safe_put(&buf), Err(PoolError::BufferReturned)));
    assert!(matches!(buf.safe_close(), Err(PoolError::BufferReturned)));
    assert!(buf.safe_is_closed());
    assert_eq!(factory.idle(), 1);
}

#[test]
fn test_safe_close_then_put() {
    let factory = BufferFactory::new();
    let buf = shared(&factory);

    assert!(!buf.safe_is_closed());
    assert!(buf.safe_close().is_ok());
    assert!(buf.safe_is_closed());
    assert!(matches!(buf.safe_close(), Err(PoolError::BufferReturned)));
    assert!(matches!(factory.safe_put(&buf), Err(PoolError::BufferReturned)));

    let stats = factory.stats();
    assert_eq!(stats.returned, 1);
    assert_eq!(stats.rejected, 2);
}

#[test]
fn test_safe_operations_after_return() {
    let factory = BufferFactory::new();
    let buf = shared(&factory);
    buf.safe_write_str("gone").unwrap();
    buf.safe_close().unwrap();

    assert!(matches!(buf.safe_write(b"x"), Err(PoolError::BufferReturned)));
    assert!(matches!(buf.safe_write_str("x"), Err(PoolError::BufferReturned)));
    assert!(matches!(buf.safe_read(&mut [0; 2]), Err(PoolError::BufferReturned)));
    assert!(matches!(buf.safe_reset(), Err(PoolError::BufferReturned)));
    assert!(matches!(buf.safe_truncate(0), Err(PoolError::BufferReturned)));
    assert!(matches!(buf.safe_read_byte(), Err(PoolError::BufferReturned)));
    assert!(buf.safe_bytes().is_empty());
    assert!(buf.safe_next(4).is_empty());
    assert_eq!(buf.safe_string(), "");
    assert_eq!(buf.safe_len(), 0);
    assert_eq!(buf.safe_cap(), 0);

    let mut sink = Vec::new();
    assert!(matches!(buf.safe_write_to(&mut sink), Err(PoolError::BufferReturned)));
    assert!(sink.is_empty());
}

#[test]
fn test_with_mutex_on_returned_buffer() {
    let factory = BufferFactory::new();
    let mut buf = factory.get();
    factory.put(&mut buf).unwrap();

    let buf = buf.with_mutex(&factory);
    assert!(buf.safe_is_closed());
    assert!(matches!(buf.safe_close(), Err(PoolError::BufferReturned)));
    assert!(matches!(factory.safe_put(&buf), Err(PoolError::BufferReturned)));
    assert_eq!(factory.idle(), 1);
}

#[test]
fn test_concurrent_writers() {
    let factory = BufferFactory::new();
    let buf = Arc::new(shared(&factory));

    let handles: Vec<_> = (0..8)
        .map(|_| {
            let buf = Arc::clone(&buf);
            thread::spawn(move || {
                for _ in 0..100 {
                    buf.safe_write(b"ab").unwrap();
                }
            })
        })
        .collect();
    for handle in handles {
        handle.join().unwrap();
    }

    let bytes = buf.safe_bytes();
    assert_eq!(bytes.len(), 8 * 100 * 2);
    // Each locked write lands whole.
    assert!(bytes.chunks(2).all(|pair| pair == b"ab"));
}

#[test]
fn test_concurrent_close_succeeds_exactly_once() {
    let factory = BufferFactory::new();
    let buf = shared(&factory);

    let successes: usize = thread::scope(|s| {
        let handles: Vec<_> = (0..16)
            .map(|i| {
                let buf = &buf;
                let factory = &factory;
                s.spawn(move || {
                    let result = if i % 2 == 0 {
                        buf.safe_close()
                    } else {
                        factory.safe_put(buf)
                    };
                    usize::from(result.is_ok())
                })
            })
            .collect();
        handles.into_iter().map(|h| h.join().unwrap()).sum()
    });

    assert_eq!(successes, 1);
    assert_eq!(factory.idle(), 1);
    assert_eq!(factory.stats().rejected, 15);
}

#[test]
fn test_with_locked_groups_steps() {
    let factory = BufferFactory::new();
    let buf = shared(&factory);

    let len = buf
        .with_locked(|inner| {
            inner.write(b"abc");
            inner.write_byte(b'd');
            inner.len()
        })
        .unwrap();
    assert_eq!(len, 4);

    buf.safe_close().unwrap();
    assert!(matches!(buf.with_locked(|inner| inner.len()), Err(PoolError::BufferReturned)));
}

#[test]
fn test_drop_recycles_live_shared_buffer() {
    let factory = BufferFactory::new();
    {
        let buf = shared(&factory);
        buf.safe_write_str("temp").unwrap();
    }
    assert_eq!(factory.idle(), 1);
    assert!(factory.get().bytes().is_empty());
}
