use latchpool::{Buffer, BufferFactory, PoolConfig, PoolError};
use std::io::{self, BufRead, Read, Write};
use std::panic::{self, AssertUnwindSafe};

/// Runs `f` and returns the `PoolError` it panicked with.
fn panic_payload<R>(f: impl FnOnce() -> R) -> PoolError {
    let payload = panic::catch_unwind(AssertUnwindSafe(f))
        .err()
        .expect("expected a panic");
    *payload
        .downcast::<PoolError>()
        .expect("panic payload should be a PoolError")
}

fn returned_buffer(factory: &BufferFactory) -> Buffer {
    let mut buf = factory.get();
    buf.write_str("stale").unwrap();
    factory.put(&mut buf).unwrap();
    buf
}

#[test]
fn test_put_twice_fails() {
    let factory = BufferFactory::new();
    let mut buf = factory.get();
    buf.write(b"data").unwrap();

    assert!(factory.put(&mut buf).is_ok());
    assert!(matches!(factory.put(&mut buf), Err(PoolError::BufferReturned)));
    assert!(factory.put(&mut buf).unwrap_err().is_returned());

    let stats = factory.stats();
    assert_eq!(stats.returned, 1);
    assert_eq!(stats.rejected, 2);
}

#[test]
fn test_returned_buffer_reads_empty() {
    let factory = BufferFactory::new();
    let buf = returned_buffer(&factory);

    assert!(buf.is_returned());
    assert!(Buffer::bytes(&buf).is_empty());
    assert_eq!(buf.len(), 0);
    assert_eq!(buf.cap(), 0);
    assert!(buf.is_empty());
    assert_eq!(buf.to_string(), "");
}

#[test]
fn test_returned_buffer_rejects_writes() {
    let factory = BufferFactory::new();
    let mut buf = returned_buffer(&factory);

    assert!(matches!(buf.write(b"x"), Err(PoolError::BufferReturned)));
    assert!(matches!(buf.write_str("x"), Err(PoolError::BufferReturned)));
    assert!(matches!(buf.write_byte(b'x'), Err(PoolError::BufferReturned)));
    assert!(matches!(buf.write_char('x'), Err(PoolError::BufferReturned)));
    assert!(matches!(buf.grow(10), Err(PoolError::BufferReturned)));
    assert!(matches!(buf.reset(), Err(PoolError::BufferReturned)));
    assert!(matches!(buf.truncate(0), Err(PoolError::BufferReturned)));
    assert!(matches!(buf.read(&mut [0; 4]), Err(PoolError::BufferReturned)));
    assert!(matches!(buf.read_byte(), Err(PoolError::BufferReturned)));
    assert!(buf.next(4).is_empty());

    // The pool never sees the rejected writes.
    let fresh = factory.get();
    assert!(Buffer::bytes(&fresh).is_empty());
}

#[test]
fn test_must_variants_panic_with_error_payload() {
    let factory = BufferFactory::new();
    let mut buf = returned_buffer(&factory);

    assert!(panic_payload(|| buf.must_bytes().len()).is_returned());
    assert!(panic_payload(|| buf.must_len()).is_returned());
    assert!(panic_payload(|| buf.must_string()).is_returned());
    assert!(panic_payload(|| buf.must_write(b"x")).is_returned());
    assert!(panic_payload(|| buf.must_write_str("x")).is_returned());
    assert!(panic_payload(|| buf.must_write_byte(b'x')).is_returned());
    assert!(panic_payload(|| buf.must_write_char('x')).is_returned());
    assert!(panic_payload(|| buf.must_grow(1)).is_returned());
    assert!(panic_payload(|| buf.must_reset()).is_returned());
    assert!(panic_payload(|| buf.must_truncate(0)).is_returned());
    assert!(panic_payload(|| factory.must_put(&mut buf)).is_returned());
}

#[test]
fn test_must_variants_succeed_on_live_buffer() {
    let factory = BufferFactory::new();
    let mut buf = factory.get();
    buf.must_write(b"ab");
    buf.must_write_str("cd");
    buf.must_write_byte(b'e');
    buf.must_write_char('f');
    assert_eq!(buf.must_len(), 6);
    assert_eq!(buf.must_bytes(), b"abcdef");
    assert_eq!(buf.must_string(), "abcdef");
    buf.must_truncate(2);
    assert_eq!(buf.must_string(), "ab");
    buf.must_reset();
    assert_eq!(buf.must_len(), 0);
    factory.must_put(&mut buf);
}

#[test]
fn test_truncate_out_of_range() {
    let factory = BufferFactory::new();
    let mut buf = factory.get();
    buf.write_str("abc").unwrap();

    match buf.truncate(10) {
        Err(PoolError::TruncateOutOfRange { len, requested }) => {
            assert_eq!(len, 3);
            assert_eq!(requested, 10);
        }
        other => panic!("unexpected result: {other:?}"),
    }
    assert_eq!(Buffer::bytes(&buf), b"abc");

    let err = panic_payload(|| buf.must_truncate(10));
    assert!(matches!(err, PoolError::TruncateOutOfRange { .. }));
}

#[test]
fn test_recycled_buffer_is_cleared() {
    let factory = BufferFactory::new();
    let mut buf = factory.get();
    buf.write_str("secret").unwrap();
    factory.put(&mut buf).unwrap();
    assert_eq!(factory.idle(), 1);

    let reused = factory.get();
    assert!(Buffer::bytes(&reused).is_empty());
    assert!(reused.cap() >= "secret".len());
    assert_eq!(factory.idle(), 0);

    let stats = factory.stats();
    assert_eq!(stats.acquired, 2);
    assert_eq!(stats.fresh, 1);
    assert_eq!(stats.recycled, 1);
}

#[test]
fn test_sized_factory() {
    let factory = BufferFactory::sized(64);
    let buf = factory.get();
    assert_eq!(buf.len(), 0);
    assert!(buf.cap() >= 64);
    assert_eq!(factory.config(), PoolConfig::sized(64));
}

#[test]
fn test_max_retained_capacity_discards_large_buffers() {
    let factory = BufferFactory::with_config(PoolConfig {
        max_retained_capacity: Some(16),
        ..PoolConfig::default()
    });
    let mut big = factory.get();
    big.write(&[0u8; 1024]).unwrap();
    factory.put(&mut big).unwrap();

    assert_eq!(factory.idle(), 0);
    assert_eq!(factory.stats().discarded, 1);
}

#[test]
fn test_close_requires_parent() {
    let factory = BufferFactory::new();
    let mut orphan = factory.get();
    assert!(matches!(orphan.close(), Err(PoolError::NoParent)));
    assert!(!orphan.is_returned());
    assert!(!orphan.is_closed());

    let mut buf = factory.get().with_parent(&factory);
    buf.write_str("bye").unwrap();
    assert!(buf.close().is_ok());
    assert!(buf.is_closed());
    assert!(matches!(buf.close(), Err(PoolError::BufferReturned)));
    assert!(matches!(factory.put(&mut buf), Err(PoolError::BufferReturned)));
    assert_eq!(factory.idle(), 1);
}

#[test]
fn test_close_after_put_fails() {
    let factory = BufferFactory::new();
    let mut buf = factory.get().with_parent(&factory);
    factory.put(&mut buf).unwrap();
    assert!(matches!(buf.close(), Err(PoolError::BufferReturned)));
    assert_eq!(factory.stats().returned, 1);
}

#[test]
fn test_drop_with_parent_recycles() {
    let factory = BufferFactory::new();
    {
        let mut buf = factory.get().with_parent(&factory);
        buf.write_str("scoped").unwrap();
    }
    assert_eq!(factory.idle(), 1);

    {
        let _orphan = factory.get();
    }
    assert_eq!(factory.idle(), 0);
}

#[test]
fn test_read_side() {
    let factory = BufferFactory::new();
    let mut buf = factory.get();
    buf.write_str("héllo\nworld").unwrap();

    assert_eq!(buf.read_byte().unwrap(), Some(b'h'));
    buf.unread_byte().unwrap();
    assert!(matches!(buf.unread_byte(), Err(PoolError::InvalidUnread)));
    assert_eq!(buf.read_byte().unwrap(), Some(b'h'));

    assert_eq!(buf.read_char().unwrap(), Some(('é', 2)));
    buf.unread_char().unwrap();
    assert_eq!(buf.read_char().unwrap(), Some(('é', 2)));

    assert_eq!(buf.read_until(b'\n').unwrap(), b"llo\n");
    assert_eq!(buf.next(3), b"wor");

    let mut rest = [0u8; 8];
    assert_eq!(buf.read(&mut rest).unwrap(), 2);
    assert_eq!(&rest[..2], b"ld");
    assert_eq!(buf.read(&mut rest).unwrap(), 0);
    assert_eq!(buf.read_byte().unwrap(), None);
}

#[test]
fn test_read_from_and_write_to() {
    let factory = BufferFactory::new();
    let mut buf = factory.get();
    let n = buf.read_from(&mut io::Cursor::new(b"streamed".to_vec())).unwrap();
    assert_eq!(n, 8);

    let mut sink = Vec::new();
    assert_eq!(buf.write_to(&mut sink).unwrap(), 8);
    assert_eq!(sink, b"streamed");
    assert!(buf.is_empty());

    factory.put(&mut buf).unwrap();
    let mut reader = io::Cursor::new(b"x".to_vec());
    assert!(matches!(buf.read_from(&mut reader), Err(PoolError::BufferReturned)));
    assert!(panic_payload(|| buf.must_write_to(&mut sink)).is_returned());
}

#[test]
fn test_write_to_failing_writer() {
    struct Broken;

    impl Write for Broken {
        fn write(&mut self, _: &[u8]) -> io::Result<usize> {
            Err(io::Error::new(io::ErrorKind::BrokenPipe, "closed"))
        }

        fn flush(&mut self) -> io::Result<()> {
            Ok(())
        }
    }

    let factory = BufferFactory::new();
    let mut buf = factory.get();
    buf.write_str("abc").unwrap();
    match buf.write_to(&mut Broken) {
        Err(PoolError::Io(err)) => assert_eq!(err.kind(), io::ErrorKind::BrokenPipe),
        other => panic!("unexpected result: {other:?}"),
    }
    assert_eq!(Buffer::bytes(&buf), b"abc");
}

#[test]
fn test_std_io_traits() {
    let factory = BufferFactory::new();
    let mut buf = factory.get();
    writeln!(buf, "line one").unwrap();
    buf.write_all(b"line two\n").unwrap();

    let mut first = String::new();
    buf.read_line(&mut first).unwrap();
    assert_eq!(first, "line one\n");

    let mut rest = String::new();
    buf.read_to_string(&mut rest).unwrap();
    assert_eq!(rest, "line two\n");

    factory.put(&mut buf).unwrap();
    let err = buf.write_all(b"late").unwrap_err();
    assert_eq!(err.kind(), io::ErrorKind::Other);
}

#[test]
fn test_fmt_write() {
    use std::fmt;

    // `Buffer` implements both `io::Write` and `fmt::Write`, so name the trait.
    let factory = BufferFactory::new();
    let mut buf = factory.get();
    fmt::Write::write_fmt(&mut buf, format_args!("{}-{}", 1, 2)).unwrap();
    assert_eq!(buf.to_string(), "1-2");

    factory.put(&mut buf).unwrap();
    assert!(fmt::Write::write_str(&mut buf, "x").is_err());
}

#[test]
fn test_factory_shared_across_threads() {
    let factory = BufferFactory::new();

    std::thread::scope(|s| {
        for t in 0..8 {
            let factory = factory.clone();
            s.spawn(move || {
                for i in 0..100 {
                    let mut buf = factory.get();
                    assert!(Buffer::bytes(&buf).is_empty());
                    buf.write_str(&format!("{t}:{i}")).unwrap();
                    factory.put(&mut buf).unwrap();
                    assert!(factory.put(&mut buf).is_err());
                }
            });
        }
    });

    let stats = factory.stats();
    assert_eq!(stats.acquired, 800);
    assert_eq!(stats.returned, 800);
    assert_eq!(stats.rejected, 800);
}
