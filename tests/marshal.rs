//! Marshalling of flat and nested structs through a library's globals.

use core::ptr::NonNull;

use osi_marshal::host::memory::{ClassId, MemoryHost, ObjectRef};
use osi_marshal::{Config, Error, LibraryGlobals, LibraryId, Marshal, PointerRepr, Value};

#[derive(Debug, Default, Marshal, PartialEq)]
#[marshal(class = "osi/test/Point")]
struct Point {
    x: i32,
    y: i32,
}

#[derive(Debug, Default, Marshal, PartialEq)]
#[marshal(class = "osi/test/Event")]
struct Event {
    r#type: i32,
    #[marshal(rename = "time")]
    timestamp: u64,
    origin: Point,
    flags: u16,
    pressed: bool,
    scale: f32,
}

#[derive(Debug, Default, Marshal, PartialEq)]
#[marshal(class = "osi/test/Handle")]
struct Handle {
    data: Option<NonNull<u8>>,
}

#[derive(Debug, Default, Marshal, PartialEq)]
#[marshal(class = "osi/test/Tagged")]
struct Tagged {
    tag: i32,
    data: Option<NonNull<u8>>,
}

fn point_class(host: &MemoryHost) -> ClassId {
    host.define_class("osi/test/Point", &[("x", "I"), ("y", "I")]).unwrap()
}

fn point(host: &MemoryHost, class: ClassId, x: i32, y: i32) -> ObjectRef {
    let object = host.new_object(class);
    host.put(object, "x", Value::Int(x)).unwrap();
    host.put(object, "y", Value::Int(y)).unwrap();
    object
}

fn globals(config: Config) -> LibraryGlobals<MemoryHost> {
    LibraryGlobals::new(LibraryId::new(0), config)
}

// Copy a mirror into a native struct, modify it, and copy it back.
#[test]
fn point_in_out() {
    let host = MemoryHost::new();
    let object = point(&host, point_class(&host), 3, -7);
    let globals = globals(Config::default());
    let env = globals.env(&host);

    let mut p = Point::default();
    env.get_fields(object, &mut p).unwrap();
    assert_eq!(p, Point { x: 3, y: -7 });

    p.x = 10;
    p.y = 20;
    env.set_fields(object, &p).unwrap();
    assert_eq!(host.get(object, "x").unwrap(), Value::Int(10));
    assert_eq!(host.get(object, "y").unwrap(), Value::Int(20));

    assert!(globals.cache::<Point>().is_resolved());
    assert_eq!(globals.cached_types(), 1);
    assert_eq!(globals.entries(), 1);
}

// The in/out pattern wraps a native call that modifies the struct.
#[test]
fn point_with_fields() {
    let host = MemoryHost::new();
    let object = point(&host, point_class(&host), 1, 2);
    let globals = globals(Config::default());
    let env = globals.env(&host);

    let mut p = Point::default();
    let sum = env
        .with_fields(object, &mut p, |p| {
            core::mem::swap(&mut p.x, &mut p.y);
            p.x + p.y
        })
        .unwrap();

    assert_eq!(sum, 3);
    assert_eq!(env.get_new::<Point>(object).unwrap(), Point { x: 2, y: 1 });
}

// Resolution is lazy, but can be forced up front.
#[test]
fn point_cache_fields() {
    let host = MemoryHost::new();
    let object = point(&host, point_class(&host), 0, 0);
    let globals = globals(Config::default());
    let env = globals.env(&host);

    assert!(!globals.cache::<Point>().is_resolved());
    env.cache_fields::<Point>(object).unwrap();
    env.cache_fields::<Point>(object).unwrap();
    assert!(globals.cache::<Point>().is_resolved());
    assert_eq!(host.lookups(), 2);
}

// A mirror class lacking a declared field fails, and no field of the native
// struct is touched.
#[test]
fn point_missing_field() {
    let host = MemoryHost::new();
    let class = host.define_class("osi/test/Point", &[("x", "I")]).unwrap();
    let object = host.new_object(class);
    let globals = globals(Config::default());

    let mut p = Point { x: 5, y: 6 };
    let e = globals.env(&host).get_fields(object, &mut p).err().unwrap();
    assert!(matches!(e, Error::FieldNotFound { class: "osi/test/Point", name: "y", .. }));
    assert_eq!(p, Point { x: 5, y: 6 });
}

// An object of another class with the same fields is rejected on first use
// and later on, and does not keep matching objects from working.
#[test]
fn point_other_class() {
    let host = MemoryHost::new();
    let point = point(&host, point_class(&host), 3, 4);
    let other_class = host.define_class("osi/test/Other", &[("x", "I"), ("y", "I")]).unwrap();
    let other = host.new_object(other_class);
    let globals = globals(Config::default());
    let env = globals.env(&host);

    let e = env.get_new::<Point>(other).err().unwrap();
    assert!(matches!(e, Error::ClassMismatch { class: "osi/test/Point" }));
    assert_eq!(env.get_new::<Point>(point).unwrap(), Point { x: 3, y: 4 });

    let e = env.set_fields(other, &Point { x: 1, y: 1 }).err().unwrap();
    assert!(matches!(e, Error::ClassMismatch { .. }));
    assert_eq!(host.get(other, "x").unwrap(), Value::Int(0));
    assert_eq!(host.lookups(), 2);
}

// Nested structs are marshalled through their own field cache, renamed and
// raw-identifier fields map to their mirror names, and unsigned values are
// reinterpreted bit-for-bit.
#[test]
fn event_nested() {
    let host = MemoryHost::new();
    let point_class = point_class(&host);
    let event_class = host
        .define_class(
            "osi/test/Event",
            &[
                ("type", "I"),
                ("time", "J"),
                ("origin", "Losi/test/Point;"),
                ("flags", "C"),
                ("pressed", "Z"),
                ("scale", "F"),
            ],
        )
        .unwrap();

    let origin = point(&host, point_class, 4, 5);
    let event = host.new_object(event_class);
    host.put(event, "type", Value::Int(12)).unwrap();
    host.put(event, "time", Value::Long(-1)).unwrap();
    host.put(event, "origin", Value::Object(Some(origin))).unwrap();
    host.put(event, "flags", Value::Char(0xbeef)).unwrap();
    host.put(event, "pressed", Value::Boolean(true)).unwrap();
    host.put(event, "scale", Value::Float(0.5)).unwrap();

    let globals = globals(Config::default());
    let env = globals.env(&host);

    let mut v = env.get_new::<Event>(event).unwrap();
    assert_eq!(
        v,
        Event {
            r#type: 12,
            timestamp: u64::MAX,
            origin: Point { x: 4, y: 5 },
            flags: 0xbeef,
            pressed: true,
            scale: 0.5,
        },
    );
    assert_eq!(globals.cached_types(), 2);

    v.origin.y = -5;
    v.timestamp = 7;
    v.pressed = false;
    env.set_fields(event, &v).unwrap();

    assert_eq!(host.get(origin, "y").unwrap(), Value::Int(-5));
    assert_eq!(host.get(event, "time").unwrap(), Value::Long(7));
    assert_eq!(host.get(event, "pressed").unwrap(), Value::Boolean(false));
    assert_eq!(host.get(event, "origin").unwrap(), Value::Object(Some(origin)));
}

// A null nested object is rejected rather than skipped.
#[test]
fn event_null_nested() {
    let host = MemoryHost::new();
    point_class(&host);
    let class = host
        .define_class(
            "osi/test/Event",
            &[
                ("type", "I"),
                ("time", "J"),
                ("origin", "Losi/test/Point;"),
                ("flags", "C"),
                ("pressed", "Z"),
                ("scale", "F"),
            ],
        )
        .unwrap();
    let event = host.new_object(class);
    let globals = globals(Config::default());

    let e = globals.env(&host).get_new::<Event>(event).err().unwrap();
    assert!(matches!(e, Error::NullObject { field: "origin" }));

    let v = Event { r#type: 5, ..Default::default() };
    let e = globals.env(&host).set_fields(event, &v).err().unwrap();
    assert!(matches!(e, Error::NullObject { field: "origin" }));
    assert_eq!(host.get(event, "type").unwrap(), Value::Int(0));
}

// A nested object of the wrong class is rejected before anything is written.
#[test]
fn event_nested_other_class() {
    let host = MemoryHost::new();
    point_class(&host);
    let other_class = host.define_class("osi/test/Other", &[("x", "I"), ("y", "I")]).unwrap();
    let class = host
        .define_class(
            "osi/test/Event",
            &[
                ("type", "I"),
                ("time", "J"),
                ("origin", "Losi/test/Point;"),
                ("flags", "C"),
                ("pressed", "Z"),
                ("scale", "F"),
            ],
        )
        .unwrap();
    let event = host.new_object(class);
    let other = host.new_object(other_class);
    host.put(event, "origin", Value::Object(Some(other))).unwrap();
    let globals = globals(Config::default());

    let v = Event { r#type: 5, origin: Point { x: 1, y: 2 }, ..Default::default() };
    let e = globals.env(&host).set_fields(event, &v).err().unwrap();
    assert!(matches!(e, Error::ClassMismatch { class: "osi/test/Point" }));
    assert_eq!(host.get(event, "type").unwrap(), Value::Int(0));
    assert_eq!(host.get(other, "x").unwrap(), Value::Int(0));
}

// Field schemas are derived from the struct declaration.
#[test]
fn event_schema() {
    let names: Vec<_> = Event::FIELDS.iter().map(|v| v.name).collect();

    assert_eq!(Event::CLASS, "osi/test/Event");
    assert_eq!(names, ["type", "time", "origin", "flags", "pressed", "scale"]);
}

// Pointers travel through 32-bit mirrors unchanged if they fit, and are
// zero-extended on the way in.
#[test]
fn pointer_int() {
    let host = MemoryHost::new();
    let class = host.define_class("osi/test/Handle", &[("data", "I")]).unwrap();
    let object = host.new_object(class);
    let globals = globals(Config { pointer: PointerRepr::Int });
    let env = globals.env(&host);

    let handle = Handle { data: NonNull::new(0x1234 as *mut u8) };
    env.set_fields(object, &handle).unwrap();
    assert_eq!(host.get(object, "data").unwrap(), Value::Int(0x1234));
    assert_eq!(env.get_new::<Handle>(object).unwrap(), handle);

    host.put(object, "data", Value::Int(-16)).unwrap();
    let v = env.get_new::<Handle>(object).unwrap();
    assert_eq!(v.data.map(|v| v.as_ptr() as usize), Some(0xffff_fff0));

    env.set_fields(object, &Handle { data: None }).unwrap();
    assert_eq!(host.get(object, "data").unwrap(), Value::Int(0));
}

// Addresses that do not fit a 32-bit mirror are rejected, never truncated.
#[cfg(target_pointer_width = "64")]
#[test]
fn pointer_narrowing() {
    let host = MemoryHost::new();
    let class = host.define_class("osi/test/Handle", &[("data", "I")]).unwrap();
    let object = host.new_object(class);
    let globals = globals(Config { pointer: PointerRepr::Int });

    let handle = Handle { data: NonNull::new(0x1_0000_0000usize as *mut u8) };
    let e = globals.env(&host).set_fields(object, &handle).err().unwrap();
    assert!(matches!(e, Error::Narrowing { field: "data", value: 0x1_0000_0000 }));
    assert_eq!(host.get(object, "data").unwrap(), Value::Int(0));
}

// A pointer that does not fit its mirror fails the write before any other
// field is touched.
#[cfg(target_pointer_width = "64")]
#[test]
fn pointer_narrowing_untouched() {
    let host = MemoryHost::new();
    let class = host.define_class("osi/test/Tagged", &[("tag", "I"), ("data", "I")]).unwrap();
    let object = host.new_object(class);
    let globals = globals(Config { pointer: PointerRepr::Int });

    let v = Tagged { tag: 42, data: NonNull::new(0x1_0000_0000usize as *mut u8) };
    let e = globals.env(&host).set_fields(object, &v).err().unwrap();
    assert!(matches!(e, Error::Narrowing { field: "data", .. }));
    assert_eq!(host.get(object, "tag").unwrap(), Value::Int(0));
    assert_eq!(host.get(object, "data").unwrap(), Value::Int(0));
}

// The configured pointer width selects the mirror descriptor.
#[test]
fn pointer_descriptor() {
    let host = MemoryHost::new();
    let class = host.define_class("osi/test/Handle", &[("data", "J")]).unwrap();
    let object = host.new_object(class);

    let e = globals(Config { pointer: PointerRepr::Int })
        .env(&host)
        .get_new::<Handle>(object)
        .err()
        .unwrap();
    assert!(matches!(e, Error::FieldNotFound { name: "data", .. }));

    let v = globals(Config { pointer: PointerRepr::Long })
        .env(&host)
        .get_new::<Handle>(object)
        .unwrap();
    assert_eq!(v.data, None);
}
