use strata_buffer::{
    AllocateDirect, ByteBuffer, ByteOrder, CharBuffer, DoubleBuffer, Element, FloatBuffer,
    IntBuffer, LongBuffer, SharedArray, ShortBuffer, TypedBuffer,
};
use strata_page_alloc::{DirectMemory, DirectMemoryConfig};

fn direct_memory(max: u64) -> DirectMemory {
    DirectMemory::new(DirectMemoryConfig::new().max_direct_memory(max))
}

#[test]
fn test_native_int_through_duplicate_view() {
    let memory = direct_memory(1 << 20);
    let mut bytes = memory.allocate_direct(16).unwrap();
    bytes.put_i32_at(0, 0x11223344).unwrap();
    assert_eq!(bytes.position(), 0);
    let view = bytes.duplicate().as_i32_buffer();
    assert_eq!(view.order(), ByteOrder::BigEndian);
    assert_eq!(view.capacity(), 4);
    assert_eq!(view.get_at(0).unwrap(), 0x11223344);
}

#[test]
fn test_relative_put_moves_view_start() {
    let memory = direct_memory(1 << 20);
    let mut bytes = memory.allocate_direct(16).unwrap();
    bytes.put_i32(0x11223344).unwrap();
    let view = bytes.duplicate().as_i32_buffer();
    assert_eq!(view.capacity(), 3);
    assert_eq!(view.get_at(0).unwrap(), 0);
    bytes.rewind();
    assert_eq!(bytes.duplicate().as_i32_buffer().get_at(0).unwrap(), 0x11223344);
}

#[test]
fn test_wrapped_short_window() {
    let array = SharedArray::from(vec![1i16, 2, 3, 4, 5]);
    let mut buffer = ShortBuffer::wrap(array, 1, 3).unwrap();
    assert_eq!(buffer.capacity(), 5);
    assert_eq!(buffer.position(), 1);
    assert_eq!(buffer.limit(), 4);
    assert_eq!(buffer.get().unwrap(), 2);
    assert_eq!(buffer.get().unwrap(), 3);
    assert_eq!(buffer.get().unwrap(), 4);
    assert!(buffer.get().unwrap_err().is_underflow());
}

#[test]
fn test_out_of_memory_does_not_leak_reservation() {
    let memory = direct_memory(1 << 16);
    let err = memory.allocate_direct(1 << 17).unwrap_err();
    assert!(err.is_out_of_memory());
    assert_eq!(memory.reserved_memory(), 0);
    assert_eq!(memory.count(), 0);

    let buffer = memory.allocate_direct(1024).unwrap();
    assert_eq!(buffer.capacity(), 1024);
    assert_eq!(memory.reserved_memory(), 1024);
}

/// Buffers of one element type over every kind of storage.
fn storages<T: Element>(values: &[T]) -> Vec<TypedBuffer<T>> {
    let memory = direct_memory(1 << 20);
    let byte_len = values.len() * T::WIDTH;
    let mut result = vec![TypedBuffer::wrap_array(SharedArray::from(values.to_vec()))];
    for order in [ByteOrder::BigEndian, ByteOrder::LittleEndian] {
        // Offset by one byte so the wide views are misaligned.
        for offset in [0, 1] {
            let mut heap = ByteBuffer::allocate(byte_len + offset);
            let mut native = memory.allocate_direct(byte_len + offset).unwrap();
            for bytes in [&mut heap, &mut native] {
                bytes.set_order(order).set_position(offset).unwrap();
                let mut view = bytes.as_typed_buffer::<T>();
                view.put_slice(values).unwrap();
                view.flip();
                result.push(view);
            }
        }
    }
    result
}

#[test]
fn test_flip_then_clear_restores_fresh_state() {
    let values = [3i32, 1, 4, 1, 5, 9, 2, 6];
    for mut buffer in storages(&values) {
        buffer.set_position(5).unwrap().mark();
        buffer.flip();
        assert_eq!(buffer.limit(), 5);
        assert!(buffer.reset().is_err());
        buffer.clear();
        assert_eq!(buffer.position(), 0);
        assert_eq!(buffer.limit(), buffer.capacity());
        assert!(buffer.reset().is_err());
        assert_eq!(buffer.to_vec(), values);
    }
}

#[test]
fn test_duplicate_equals_source() {
    let values = [10i64, -20, 30, -40, 50];
    for mut buffer in storages(&values) {
        let mut duplicate = buffer.duplicate();
        assert_eq!(duplicate, buffer);
        assert_eq!(duplicate.hash_code(), buffer.hash_code());

        buffer.set_position(1).unwrap().set_limit(4).unwrap();
        duplicate.set_position(1).unwrap().set_limit(4).unwrap();
        assert_eq!(duplicate, buffer);
        assert_eq!(duplicate.mismatch(&buffer), None);
    }
}

#[test]
fn test_slice_writes_visible_both_ways() {
    let values = [1.0f32, 2.0, 3.0, 4.0, 5.0];
    for mut buffer in storages(&values) {
        buffer.set_position(2).unwrap();
        let mut slice = buffer.slice();
        assert_eq!(slice.capacity(), 3);
        slice.put_at(0, 30.0).unwrap();
        assert_eq!(buffer.get_at(2).unwrap(), 30.0);
        buffer.put_at(4, 50.0).unwrap();
        assert_eq!(slice.get_at(2).unwrap(), 50.0);
    }
}

#[test]
fn test_compact_moves_remaining_to_front() {
    let values = [1u16, 2, 3, 4, 5, 6];
    for mut buffer in storages(&values) {
        buffer.set_position(2).unwrap().set_limit(5).unwrap().mark();
        buffer.compact().unwrap();
        assert_eq!(buffer.position(), 3);
        assert_eq!(buffer.limit(), buffer.capacity());
        assert!(buffer.reset().is_err());
        buffer.flip();
        assert_eq!(buffer.to_vec(), vec![3, 4, 5]);
    }
}

fn check_put_get<T: Element>(mut buffer: TypedBuffer<T>, value: T) {
    buffer.put(value).unwrap();
    let position = buffer.position();
    buffer.set_position(position - 1).unwrap();
    assert_eq!(buffer.get().unwrap(), value);
}

#[test]
fn test_put_then_get_for_every_width_and_order() {
    let memory = direct_memory(1 << 20);
    for order in [ByteOrder::BigEndian, ByteOrder::LittleEndian] {
        let make = |offset: usize| {
            let mut bytes = memory.allocate_direct(32).unwrap();
            bytes.set_order(order).set_position(offset).unwrap();
            bytes
        };
        for offset in [0, 3] {
            let mut bytes = make(offset);
            bytes.put_u16(0xFEDC).unwrap();
            bytes.set_position(offset).unwrap();
            assert_eq!(bytes.get_u16().unwrap(), 0xFEDC);

            check_put_get(make(offset), 0xA5u8);
            check_put_get::<u16>(make(offset).as_u16_buffer(), 0xBEEF);
            check_put_get::<i16>(make(offset).as_i16_buffer(), -2);
            check_put_get::<i32>(make(offset).as_i32_buffer(), -123_456_789);
            check_put_get::<i64>(make(offset).as_i64_buffer(), 0x0102_0304_0506_0708);
            check_put_get::<f32>(make(offset).as_f32_buffer(), -1.25);
            check_put_get::<f64>(make(offset).as_f64_buffer(), 6.02e23);
        }
    }
    check_put_get(CharBuffer::allocate(1), 0x20AC);
    check_put_get(IntBuffer::allocate(1), i32::MIN);
    check_put_get(LongBuffer::allocate(1), i64::MAX);
    check_put_get(FloatBuffer::allocate(1), f32::EPSILON);
    check_put_get(DoubleBuffer::allocate(1), f64::MIN_POSITIVE);
}

#[test]
fn test_bulk_transfers_across_storage_kinds() {
    let values = (0..40).map(|i| i * 1_000_003).collect::<Vec<i32>>();
    let zeros = vec![0i32; values.len()];
    for src in storages(&values) {
        for mut dst in storages(&zeros) {
            let mut src = src.duplicate();
            dst.clear();
            dst.put_buffer(&mut src).unwrap();
            assert_eq!(src.remaining(), 0);
            dst.flip();
            let mut out = vec![0i32; values.len()];
            dst.get_slice(&mut out).unwrap();
            assert_eq!(out, values);
        }
    }
}

#[test]
fn test_native_views_with_different_orders_overlap() {
    let memory = direct_memory(1 << 20);
    let mut bytes = memory.allocate_direct(16).unwrap();
    let mut big = bytes.as_i16_buffer();
    big.put_slice(&[0x0102, 0x0304, 0x0506, 0x0708]).unwrap();
    big.flip();
    bytes.set_order(ByteOrder::LittleEndian).set_position(2).unwrap();
    let mut little = bytes.as_i16_buffer();
    little.put_buffer(&mut big).unwrap();
    bytes.set_order(ByteOrder::BigEndian).set_position(2).unwrap();
    let mut out = [0i16; 4];
    bytes.as_i16_buffer().get_slice(&mut out).unwrap();
    assert_eq!(out, [0x0201, 0x0403, 0x0605, 0x0807]);
}

#[test]
fn test_mismatch_is_none_iff_equal() {
    let mut rng = fastrand::Rng::with_seed(0x5EED);
    for _ in 0..500 {
        let len_a = rng.usize(0..8);
        let len_b = if rng.bool() { len_a } else { rng.usize(0..8) };
        let a = (0..len_a).map(|_| rng.i16(0..3)).collect::<Vec<_>>();
        let b = (0..len_b).map(|_| rng.i16(0..3)).collect::<Vec<_>>();
        let a = ShortBuffer::wrap_array(SharedArray::from(a));
        let b = ShortBuffer::wrap_array(SharedArray::from(b));

        let mismatch = a.mismatch(&b);
        assert_eq!(mismatch.is_none(), a == b);
        assert_eq!(mismatch.is_none(), a.compare_to(&b).is_eq());
        assert_eq!(mismatch, b.mismatch(&a));
        if let Some(i) = mismatch {
            let common = a.remaining().min(b.remaining());
            assert!(i <= common);
            if i < common {
                assert_ne!(a.get_at(i).unwrap(), b.get_at(i).unwrap());
            } else {
                assert_ne!(a.remaining(), b.remaining());
            }
        } else {
            assert_eq!(a.hash_code(), b.hash_code());
        }
    }
}

#[test]
fn test_float_buffers_treat_nans_as_equal() {
    let a = DoubleBuffer::wrap_array(SharedArray::from(vec![f64::NAN, 0.0]));
    let b = DoubleBuffer::wrap_array(SharedArray::from(vec![-f64::NAN, -0.0]));
    assert_eq!(a, b);
    assert_eq!(a.mismatch(&b), None);
    assert_eq!(a.hash_code(), b.hash_code());

    let c = DoubleBuffer::wrap_array(SharedArray::from(vec![f64::INFINITY, 0.0]));
    assert!(a > c);
}

#[test]
fn test_hash_ignores_absolute_position() {
    let a = IntBuffer::wrap(SharedArray::from(vec![7, 7, 1, 2, 3]), 2, 3).unwrap();
    let b = IntBuffer::wrap_array(SharedArray::from(vec![1, 2, 3]));
    assert_eq!(a.hash_code(), b.hash_code());

    use std::collections::HashSet;
    let set = [a, b].into_iter().collect::<HashSet<_>>();
    assert_eq!(set.len(), 1);
}

/// Runs bulk get, put and buffer-to-buffer transfers through a native long
/// view and returns the bytes they leave behind.
fn bulk_transfer_image(copy_threshold: usize, order: ByteOrder, offset: usize) -> Vec<u8> {
    let memory = DirectMemory::new(
        DirectMemoryConfig::new()
            .max_direct_memory(1 << 20)
            .copy_threshold(copy_threshold),
    );
    let values = (0..16).map(|i| (i << 40) - 7 * i).collect::<Vec<i64>>();
    let mut bytes = memory.allocate_direct(offset + 32 * 8).unwrap();
    bytes.set_order(order).set_position(offset).unwrap();
    let mut view = bytes.as_i64_buffer();

    view.put_slice(&values[..8]).unwrap();
    let mut heap = LongBuffer::wrap_array(SharedArray::from(values[8..].to_vec()));
    view.put_buffer(&mut heap).unwrap();
    let mut native = view.duplicate();
    native.flip();
    view.put_buffer(&mut native).unwrap();
    assert_eq!(view.position(), 32);

    view.rewind();
    let mut out = vec![0i64; 32];
    view.get_slice(&mut out).unwrap();
    assert_eq!(out[..16], values[..]);
    assert_eq!(out[16..], values[..]);

    let mut copy = LongBuffer::allocate(32);
    view.rewind();
    copy.put_buffer(&mut view).unwrap();
    assert_eq!(copy.to_vec(), Vec::<i64>::new());
    copy.flip();
    assert_eq!(copy.to_vec(), out);

    bytes.rewind();
    bytes.to_vec()
}

#[test]
fn test_copy_threshold_does_not_change_results() {
    for order in [ByteOrder::native(), ByteOrder::native().reverse()] {
        for offset in [0, 1] {
            let block = bulk_transfer_image(0, order, offset);
            let elementwise = bulk_transfer_image(usize::MAX, order, offset);
            assert_eq!(block, elementwise);

            let mut expected = ByteBuffer::allocate(8);
            expected.set_order(order).put_i64((1 << 40) - 7).unwrap();
            assert_eq!(block[offset + 8..offset + 16], expected.array().unwrap().to_vec());
        }
    }
}
