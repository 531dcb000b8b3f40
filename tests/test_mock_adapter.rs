//! Test doubles for interfaces that move `Box`es across their boundary.
//!
//! A double records the boxes it receives as handles, so expectations can be
//! matched by address while the caller keeps observing the object, and hands
//! out boxes it was primed with as handles.

use std::collections::VecDeque;
use std::fmt::{self, Write as _};

use parking_lot::Mutex;

use owned_pointer::{make_owned, owned_cast, DropNotifier, Error, OwnedPtr, Tracked};

trait Item: Tracked + Send + Sync {
    fn id(&self) -> u32;
}

#[derive(Default)]
struct Widget {
    id: u32,
    notifier: DropNotifier,
}

impl Tracked for Widget {
    fn drop_notifier(&self) -> &DropNotifier {
        &self.notifier
    }
}

impl Item for Widget {
    fn id(&self) -> u32 {
        self.id
    }
}

trait Sink {
    fn take(&self, item: Option<Box<dyn Item>>) -> i32;
}

#[derive(Default)]
struct SinkMock {
    expected: Mutex<VecDeque<(Option<OwnedPtr<dyn Item>>, i32)>>,
    received: Mutex<Vec<OwnedPtr<dyn Item>>>,
}

impl SinkMock {
    /// `None` matches any non-null item.
    fn expect_take(&self, matcher: Option<OwnedPtr<dyn Item>>, ret: i32) {
        self.expected.lock().push_back((matcher, ret));
    }

    fn verify(&self) {
        assert!(self.expected.lock().is_empty(), "unsatisfied expectations");
    }
}

impl Sink for SinkMock {
    fn take(&self, item: Option<Box<dyn Item>>) -> i32 {
        let item = item.map_or_else(OwnedPtr::null, OwnedPtr::from_tracked);
        let (matcher, ret) = self
            .expected
            .lock()
            .pop_front()
            .expect("unexpected call to take");

        match matcher {
            Some(expected) => assert_eq!(item, expected),
            None => assert!(!item.is_null()),
        }

        self.received.lock().push(item);
        ret
    }
}

trait WriterFactory {
    fn create(&self, name: &str) -> Box<dyn fmt::Write>;
}

#[derive(Default)]
struct WriterFactoryMock {
    primed: Mutex<VecDeque<OwnedPtr<dyn fmt::Write>>>,
}

impl WriterFactoryMock {
    fn will_return(&self, writer: OwnedPtr<dyn fmt::Write>) {
        self.primed.lock().push_back(writer);
    }
}

impl WriterFactory for WriterFactoryMock {
    fn create(&self, _name: &str) -> Box<dyn fmt::Write> {
        self.primed
            .lock()
            .pop_front()
            .and_then(|writer| writer.into_box().ok().flatten())
            .expect("unexpected call to create")
    }
}

#[test]
fn test_box_parameter_matched_by_handle() {
    let mock = SinkMock::default();
    let item = owned_cast!(
        OwnedPtr::from_tracked(Box::new(Widget { id: 7, ..Default::default() })) => dyn Item
    );

    mock.expect_take(Some(item.clone()), 0);

    let sink: &dyn Sink = &mock;
    assert_eq!(sink.take(item.acquire().unwrap()), 0);
    mock.verify();

    assert!(item.same_lineage(&mock.received.lock()[0]));
    assert!(!item.is_acquired());
    assert_eq!(item.borrow().unwrap().id(), 7);
}

#[test]
fn test_null_and_not_null_matchers() {
    let mock = SinkMock::default();
    let item: OwnedPtr<dyn Item> = owned_cast!(
        OwnedPtr::from_tracked(Box::new(Widget { id: 0x123, ..Default::default() })) => dyn Item
    );

    mock.expect_take(None, 1);
    mock.expect_take(Some(OwnedPtr::null()), 2);

    let sink: &dyn Sink = &mock;
    assert_eq!(sink.take(item.acquire().unwrap()), 1);
    assert_eq!(sink.take(None), 2);
    mock.verify();

    assert_eq!(item.borrow().unwrap().id(), 0x123);
}

#[test]
fn test_box_return_value_primed_with_handle() {
    let factory = WriterFactoryMock::default();
    let buffer = make_owned(String::new());

    factory.will_return(owned_cast!(buffer.clone() => dyn fmt::Write));

    let created = {
        let factory: &dyn WriterFactory = &factory;
        let mut writer = factory.create("test-test");
        writer.write_str("test-test").unwrap();
        writer
    };

    assert!(buffer == created);
    assert!(buffer.is_acquired());
    assert_eq!(buffer.borrow().err(), Some(Error::AlreadyAcquired));
}
