use owned_pointer::{make_tracked, DropNotifier, OwnedPtr, Tracked};

struct Foo {
    id: usize,
    notifier: DropNotifier,
}

impl Foo {
    fn new(id: usize) -> Self {
        log::info!("Foo({})", id);

        Self {
            id,
            notifier: DropNotifier::new(),
        }
    }
}

impl Tracked for Foo {
    fn drop_notifier(&self) -> &DropNotifier {
        &self.notifier
    }
}

impl Drop for Foo {
    fn drop(&mut self) {
        log::info!("~Foo({})", self.id);
    }
}

fn main() -> anyhow::Result<()> {
    env_logger::init();

    let mut shared: Vec<OwnedPtr<Foo>> = (0..10).map(|id| make_tracked(Foo::new(id))).collect();
    println!("---------------------------");

    let mut unique = Vec::new();
    for p in shared.iter().step_by(2) {
        unique.extend(p.acquire()?);
    }

    unique.clear();
    shared.retain(|p| !p.is_expired());

    println!("{} handles left", shared.len());
    println!("---------------------------");

    Ok(())
}
