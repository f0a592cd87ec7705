use crate::shape::Shape;

/// Handle to a shape in the current frame's buffer.
///
/// Handles carry the frame they were issued in, so a handle kept past
/// [`FrameShapeBuffer::clear`] resolves to nothing instead of to whatever
/// shape now occupies the same slot.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ShapeId {
    frame: u64,
    index: u32,
}

impl ShapeId {
    pub fn index(&self) -> usize {
        self.index as usize
    }

    pub fn frame(&self) -> u64 {
        self.frame
    }
}

/// Owns every shape submitted during the current frame.
///
/// Backed by a single vector that is reset, not freed, at [`clear`](Self::clear),
/// so steady-state frames do not allocate once the buffer has warmed up.
#[derive(Debug, Default)]
pub struct FrameShapeBuffer {
    shapes: Vec<Shape>,
    frame: u64,
}

impl FrameShapeBuffer {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a shape. Returns `None` only if the frame has overflowed the
    /// handle space.
    pub fn submit(&mut self, shape: Shape) -> Option<ShapeId> {
        let index = u32::try_from(self.shapes.len()).ok()?;
        self.shapes.push(shape);
        Some(ShapeId {
            frame: self.frame,
            index,
        })
    }

    /// Drop every buffered shape and start a new frame.
    pub fn clear(&mut self) {
        self.shapes.clear();
        self.frame = self.frame.wrapping_add(1);
    }

    pub fn get(&self, id: ShapeId) -> Option<&Shape> {
        if id.frame != self.frame {
            return None;
        }
        self.shapes.get(id.index())
    }

    /// Shapes in submission order, with their handles.
    pub fn iter(&self) -> impl Iterator<Item = (ShapeId, &Shape)> {
        let frame = self.frame;
        self.shapes.iter().enumerate().map(move |(i, s)| {
            (
                ShapeId {
                    frame,
                    index: i as u32,
                },
                s,
            )
        })
    }

    pub fn shapes(&self) -> &[Shape] {
        &self.shapes
    }

    pub fn len(&self) -> usize {
        self.shapes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.shapes.is_empty()
    }

    pub fn frame(&self) -> u64 {
        self.frame
    }

    pub fn capacity(&self) -> usize {
        self.shapes.capacity()
    }
}
