//! Embedded fixed-size arrays and their mirror arrays.

use osi_marshal::host::memory::{MemoryHost, ObjectRef};
use osi_marshal::{Config, Error, LibraryGlobals, LibraryId, Marshal, Value};

#[derive(Debug, Default, Marshal, PartialEq)]
#[marshal(class = "osi/test/Buffer")]
struct Buffer {
    len: i32,
    data: [u8; 8],
}

#[derive(Debug, Default, Marshal, PartialEq)]
#[marshal(class = "osi/test/Matrix")]
struct Matrix {
    values: [f64; 4],
}

fn buffer(host: &MemoryHost, data: ObjectRef) -> ObjectRef {
    let class = host.define_class("osi/test/Buffer", &[("len", "I"), ("data", "[B")]).unwrap();
    let object = host.new_object(class);
    host.put(object, "data", Value::Object(Some(data))).unwrap();
    object
}

// Arrays of matching length are copied in and out element by element.
#[test]
fn array_copy() {
    let host = MemoryHost::new();
    let data = host.new_array::<u8>(&[1, 2, 3, 4, 5, 6, 7, 0xff]);
    let object = buffer(&host, data);
    let globals = LibraryGlobals::<MemoryHost>::new(LibraryId::new(0), Config::default());
    let env = globals.env(&host);

    let mut v = env.get_new::<Buffer>(object).unwrap();
    assert_eq!(v.data, [1, 2, 3, 4, 5, 6, 7, 0xff]);

    v.len = 8;
    v.data.reverse();
    env.set_fields(object, &v).unwrap();
    assert_eq!(host.array::<u8>(data).unwrap(), vec![0xff, 7, 6, 5, 4, 3, 2, 1]);
    assert_eq!(host.get(object, "len").unwrap(), Value::Int(8));
}

// A mirror array of another length is rejected in both directions, and the
// mirror is left untouched, including fields declared before the array.
#[test]
fn array_length_mismatch() {
    let host = MemoryHost::new();
    let data = host.new_array::<u8>(&[9; 6]);
    let object = buffer(&host, data);
    let globals = LibraryGlobals::<MemoryHost>::new(LibraryId::new(0), Config::default());
    let env = globals.env(&host);

    let e = env.get_new::<Buffer>(object).err().unwrap();
    assert!(matches!(
        e,
        Error::LengthMismatch { field: "data", expected: 8, actual: 6 },
    ));

    let e = env.set_fields(object, &Buffer { len: 8, data: [1; 8] }).err().unwrap();
    assert!(matches!(e, Error::LengthMismatch { .. }));
    assert_eq!(host.array::<u8>(data).unwrap(), vec![9; 6]);
    assert_eq!(host.get(object, "len").unwrap(), Value::Int(0));
}

// A mirror array of the wrong element type is reported by the host.
#[test]
fn array_element_mismatch() {
    let host = MemoryHost::new();
    let data = host.new_array::<i32>(&[0; 8]);
    let object = buffer(&host, data);
    let globals = LibraryGlobals::<MemoryHost>::new(LibraryId::new(0), Config::default());

    let e = globals.env(&host).get_new::<Buffer>(object).err().unwrap();
    assert!(matches!(e, Error::Host(_)));
}

// A null array field is rejected.
#[test]
fn array_null() {
    let host = MemoryHost::new();
    let class = host.define_class("osi/test/Matrix", &[("values", "[D")]).unwrap();
    let object = host.new_object(class);
    let globals = LibraryGlobals::<MemoryHost>::new(LibraryId::new(0), Config::default());
    let env = globals.env(&host);

    let e = env.get_new::<Matrix>(object).err().unwrap();
    assert!(matches!(e, Error::NullObject { field: "values" }));

    let values = host.new_array::<f64>(&[1.0, 0.0, 0.0, 1.0]);
    host.put(object, "values", Value::Object(Some(values))).unwrap();
    assert_eq!(env.get_new::<Matrix>(object).unwrap().values, [1.0, 0.0, 0.0, 1.0]);
}
