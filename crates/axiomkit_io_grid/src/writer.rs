//! Size-reporting writers, post-write formatters and their combinators.
//!
//! A writer puts content into a document starting at a target cell and reports
//! the rectangle it consumed. Composition only learns about layout through that
//! reported size, so every combinator here keeps it exact: sequencing places the
//! next writer at the target shifted by the previous size, and formatting never
//! changes it.
//!
//! All values are immutable and cheap to clone (`Arc` inside); combinators borrow
//! their inputs and return new values.

use std::any::{Any, type_name};
use std::sync::Arc;

use crate::document::CellDocument;
use crate::scalar::{CellScalar, derive_cell_value_from_any, is_supported_scalar_type};
use crate::spec::{GridWriteError, Result, SpecCellIndex, SpecCellRange, SpecCellSize};

type FnWrite<D> = dyn Fn(&mut D, SpecCellIndex) -> Result<SpecCellSize> + Send + Sync;
type FnWriteValue<D, T> = dyn Fn(&mut D, SpecCellIndex, &T) -> Result<SpecCellSize> + Send + Sync;
type FnFormat<D> = dyn Fn(&mut D, SpecCellRange) -> Result<()> + Send + Sync;
type FnFormatValue<D, T> = dyn Fn(&mut D, SpecCellRange, &T) -> Result<()> + Send + Sync;

////////////////////////////////////////////////////////////////////////////////
// #region Formatters

/// Side-effect-only pass over an already written range.
pub struct Formatter<D> {
    f_format: Arc<FnFormat<D>>,
}

impl<D> Clone for Formatter<D> {
    fn clone(&self) -> Self {
        Self {
            f_format: Arc::clone(&self.f_format),
        }
    }
}

impl<D: 'static> Formatter<D> {
    pub fn new<F>(f_format: F) -> Self
    where
        F: Fn(&mut D, SpecCellRange) -> Result<()> + Send + Sync + 'static,
    {
        Self {
            f_format: Arc::new(f_format),
        }
    }

    /// Formatter that does nothing.
    pub fn empty() -> Self {
        Self::new(|_, _| Ok(()))
    }

    pub fn format(&self, doc: &mut D, range: SpecCellRange) -> Result<()> {
        (self.f_format)(doc, range)
    }

    /// Run `self`, then `next`, over the same range.
    pub fn then(&self, next: &Formatter<D>) -> Self {
        let fmt_first = self.clone();
        let fmt_next = next.clone();
        Self::new(move |doc, range| {
            fmt_first.format(doc, range)?;
            fmt_next.format(doc, range)
        })
    }
}

impl<D: 'static> Default for Formatter<D> {
    fn default() -> Self {
        Self::empty()
    }
}

/// Formatter that also receives the value that was written.
pub struct ValueFormatter<D, T> {
    f_format: Arc<FnFormatValue<D, T>>,
}

impl<D, T> Clone for ValueFormatter<D, T> {
    fn clone(&self) -> Self {
        Self {
            f_format: Arc::clone(&self.f_format),
        }
    }
}

impl<D: 'static, T: 'static> ValueFormatter<D, T> {
    pub fn new<F>(f_format: F) -> Self
    where
        F: Fn(&mut D, SpecCellRange, &T) -> Result<()> + Send + Sync + 'static,
    {
        Self {
            f_format: Arc::new(f_format),
        }
    }

    pub fn empty() -> Self {
        Self::new(|_, _, _| Ok(()))
    }

    /// Lift a value-agnostic formatter.
    pub fn from_formatter(formatter: &Formatter<D>) -> Self {
        let fmt_inner = formatter.clone();
        Self::new(move |doc, range, _| fmt_inner.format(doc, range))
    }

    pub fn format(&self, doc: &mut D, range: SpecCellRange, value: &T) -> Result<()> {
        (self.f_format)(doc, range, value)
    }

    pub fn then(&self, next: &ValueFormatter<D, T>) -> Self {
        let fmt_first = self.clone();
        let fmt_next = next.clone();
        Self::new(move |doc, range, value| {
            fmt_first.format(doc, range, value)?;
            fmt_next.format(doc, range, value)
        })
    }
}

impl<D: 'static, T: 'static> Default for ValueFormatter<D, T> {
    fn default() -> Self {
        Self::empty()
    }
}

impl<D: 'static, T: 'static> From<Formatter<D>> for ValueFormatter<D, T> {
    fn from(formatter: Formatter<D>) -> Self {
        Self::from_formatter(&formatter)
    }
}

// #endregion
////////////////////////////////////////////////////////////////////////////////
// #region Writers

/// Writer of fixed content.
pub struct Writer<D> {
    f_write: Arc<FnWrite<D>>,
}

impl<D> Clone for Writer<D> {
    fn clone(&self) -> Self {
        Self {
            f_write: Arc::clone(&self.f_write),
        }
    }
}

impl<D: 'static> Writer<D> {
    pub fn new<F>(f_write: F) -> Self
    where
        F: Fn(&mut D, SpecCellIndex) -> Result<SpecCellSize> + Send + Sync + 'static,
    {
        Self {
            f_write: Arc::new(f_write),
        }
    }

    /// Writer that touches nothing and reports `(0, 0)`.
    pub fn empty() -> Self {
        Self::new(|_, _| Ok(SpecCellSize::empty()))
    }

    /// Write at `index` and return the consumed size.
    pub fn write(&self, doc: &mut D, index: SpecCellIndex) -> Result<SpecCellSize> {
        (self.f_write)(doc, index)
    }

    /// Write `self`, then `next` directly below it.
    pub fn top_down(&self, next: &Writer<D>) -> Writer<D> {
        let w_first = self.clone();
        let w_next = next.clone();
        Writer::new(move |doc, index| {
            let size_first = w_first.write(doc, index)?;
            let size_next = w_next.write(doc, index.down(size_first))?;
            Ok(size_first.add_height_max_width(size_next))
        })
    }

    /// Write `self`, then the value writer `next` directly below it.
    pub fn top_down_value<T: 'static>(&self, next: &ValueWriter<D, T>) -> ValueWriter<D, T> {
        let w_first = self.clone();
        let w_next = next.clone();
        ValueWriter::new(move |doc, index, value: &T| {
            let size_first = w_first.write(doc, index)?;
            let size_next = w_next.write(doc, index.down(size_first), value)?;
            Ok(size_first.add_height_max_width(size_next))
        })
    }

    /// Write `self`, then `next` directly to its right.
    pub fn left_right(&self, next: &Writer<D>) -> Writer<D> {
        let w_first = self.clone();
        let w_next = next.clone();
        Writer::new(move |doc, index| {
            let size_first = w_first.write(doc, index)?;
            let size_next = w_next.write(doc, index.right(size_first))?;
            Ok(size_first.add_width_max_height(size_next))
        })
    }

    /// Write `self`, then the value writer `next` directly to its right.
    pub fn left_right_value<T: 'static>(&self, next: &ValueWriter<D, T>) -> ValueWriter<D, T> {
        let w_first = self.clone();
        let w_next = next.clone();
        ValueWriter::new(move |doc, index, value: &T| {
            let size_first = w_first.write(doc, index)?;
            let size_next = w_next.write(doc, index.right(size_first), value)?;
            Ok(size_first.add_width_max_height(size_next))
        })
    }

    /// Stack all `writers` top to bottom, in order.
    pub fn top_down_all(writers: impl IntoIterator<Item = Writer<D>>) -> Writer<D> {
        let l_writers: Vec<Writer<D>> = writers.into_iter().collect();
        Writer::new(move |doc, index| {
            let mut size = SpecCellSize::empty();
            for writer in &l_writers {
                let size_item = writer.write(doc, index.down(size))?;
                size = size.add_height_max_width(size_item);
            }
            Ok(size)
        })
    }

    /// Place all `writers` left to right, in order.
    pub fn left_right_all(writers: impl IntoIterator<Item = Writer<D>>) -> Writer<D> {
        let l_writers: Vec<Writer<D>> = writers.into_iter().collect();
        Writer::new(move |doc, index| {
            let mut size = SpecCellSize::empty();
            for writer in &l_writers {
                let size_item = writer.write(doc, index.right(size))?;
                size = size.add_width_max_height(size_item);
            }
            Ok(size)
        })
    }

    /// Run `formatter` over the exact range this writer consumed.
    ///
    /// The reported size is returned unchanged.
    pub fn with_format(&self, formatter: &Formatter<D>) -> Writer<D> {
        let w_inner = self.clone();
        let fmt_inner = formatter.clone();
        Writer::new(move |doc, index| {
            let size = w_inner.write(doc, index)?;
            fmt_inner.format(doc, SpecCellRange::new(index, size))?;
            Ok(size)
        })
    }
}

/// Writer whose content depends on a value supplied at write time.
pub struct ValueWriter<D, T> {
    f_write: Arc<FnWriteValue<D, T>>,
}

impl<D, T> Clone for ValueWriter<D, T> {
    fn clone(&self) -> Self {
        Self {
            f_write: Arc::clone(&self.f_write),
        }
    }
}

impl<D: 'static, T: 'static> ValueWriter<D, T> {
    pub fn new<F>(f_write: F) -> Self
    where
        F: Fn(&mut D, SpecCellIndex, &T) -> Result<SpecCellSize> + Send + Sync + 'static,
    {
        Self {
            f_write: Arc::new(f_write),
        }
    }

    /// Write `value` at `index` and return the consumed size.
    pub fn write(&self, doc: &mut D, index: SpecCellIndex, value: &T) -> Result<SpecCellSize> {
        (self.f_write)(doc, index, value)
    }

    /// Adapt to a richer input type; `f_select` maps the new type to the old one.
    pub fn select<R: 'static, F>(&self, f_select: F) -> ValueWriter<D, R>
    where
        F: Fn(&R) -> T + Send + Sync + 'static,
    {
        let w_inner = self.clone();
        ValueWriter::new(move |doc, index, value: &R| w_inner.write(doc, index, &f_select(value)))
    }

    /// Fix the value, producing a writer of constant content.
    pub fn bind(&self, value: T) -> Writer<D>
    where
        T: Send + Sync,
    {
        let w_inner = self.clone();
        Writer::new(move |doc, index| w_inner.write(doc, index, &value))
    }

    /// Accept an optional value; an absent value writes nothing and reports `(0, 0)`.
    pub fn optional(&self) -> ValueWriter<D, Option<T>> {
        let w_inner = self.clone();
        ValueWriter::new(move |doc, index, value: &Option<T>| match value {
            Some(val) => w_inner.write(doc, index, val),
            None => Ok(SpecCellSize::empty()),
        })
    }

    /// Write `self`, then `next` below it, both with the same value.
    pub fn top_down(&self, next: &ValueWriter<D, T>) -> ValueWriter<D, T> {
        let w_first = self.clone();
        let w_next = next.clone();
        ValueWriter::new(move |doc, index, value: &T| {
            let size_first = w_first.write(doc, index, value)?;
            let size_next = w_next.write(doc, index.down(size_first), value)?;
            Ok(size_first.add_height_max_width(size_next))
        })
    }

    /// Write `self`, then the fixed writer `next` below it.
    pub fn top_down_writer(&self, next: &Writer<D>) -> ValueWriter<D, T> {
        let w_first = self.clone();
        let w_next = next.clone();
        ValueWriter::new(move |doc, index, value: &T| {
            let size_first = w_first.write(doc, index, value)?;
            let size_next = w_next.write(doc, index.down(size_first))?;
            Ok(size_first.add_height_max_width(size_next))
        })
    }

    /// Write `self`, then `next` to its right, both with the same value.
    pub fn left_right(&self, next: &ValueWriter<D, T>) -> ValueWriter<D, T> {
        let w_first = self.clone();
        let w_next = next.clone();
        ValueWriter::new(move |doc, index, value: &T| {
            let size_first = w_first.write(doc, index, value)?;
            let size_next = w_next.write(doc, index.right(size_first), value)?;
            Ok(size_first.add_width_max_height(size_next))
        })
    }

    /// Write `self`, then the fixed writer `next` to its right.
    pub fn left_right_writer(&self, next: &Writer<D>) -> ValueWriter<D, T> {
        let w_first = self.clone();
        let w_next = next.clone();
        ValueWriter::new(move |doc, index, value: &T| {
            let size_first = w_first.write(doc, index, value)?;
            let size_next = w_next.write(doc, index.right(size_first))?;
            Ok(size_first.add_width_max_height(size_next))
        })
    }

    /// Repeat once per element, each placed below the previous ones.
    pub fn top_down_many(&self) -> ValueWriter<D, Vec<T>> {
        let w_item = self.clone();
        ValueWriter::new(move |doc, index, values: &Vec<T>| {
            w_item.write_top_down_many(doc, index, values)
        })
    }

    /// Repeat once per element, each placed right of the previous ones.
    pub fn left_right_many(&self) -> ValueWriter<D, Vec<T>> {
        let w_item = self.clone();
        ValueWriter::new(move |doc, index, values: &Vec<T>| {
            w_item.write_left_right_many(doc, index, values)
        })
    }

    /// Write every element of `values` top to bottom, in order.
    pub fn write_top_down_many(
        &self,
        doc: &mut D,
        index: SpecCellIndex,
        values: &[T],
    ) -> Result<SpecCellSize> {
        let mut size = SpecCellSize::empty();
        for value in values {
            let size_item = self.write(doc, index.down(size), value)?;
            size = size.add_height_max_width(size_item);
        }
        Ok(size)
    }

    /// Write every element of `values` left to right, in order.
    pub fn write_left_right_many(
        &self,
        doc: &mut D,
        index: SpecCellIndex,
        values: &[T],
    ) -> Result<SpecCellSize> {
        let mut size = SpecCellSize::empty();
        for value in values {
            let size_item = self.write(doc, index.right(size), value)?;
            size = size.add_width_max_height(size_item);
        }
        Ok(size)
    }

    /// Stack all `writers` top to bottom, each receiving the same value.
    pub fn top_down_all(writers: impl IntoIterator<Item = ValueWriter<D, T>>) -> Self {
        let l_writers: Vec<ValueWriter<D, T>> = writers.into_iter().collect();
        Self::new(move |doc, index, value: &T| {
            let mut size = SpecCellSize::empty();
            for writer in &l_writers {
                let size_item = writer.write(doc, index.down(size), value)?;
                size = size.add_height_max_width(size_item);
            }
            Ok(size)
        })
    }

    /// Place all `writers` left to right, each receiving the same value.
    pub fn left_right_all(writers: impl IntoIterator<Item = ValueWriter<D, T>>) -> Self {
        let l_writers: Vec<ValueWriter<D, T>> = writers.into_iter().collect();
        Self::new(move |doc, index, value: &T| {
            let mut size = SpecCellSize::empty();
            for writer in &l_writers {
                let size_item = writer.write(doc, index.right(size), value)?;
                size = size.add_width_max_height(size_item);
            }
            Ok(size)
        })
    }

    /// Run `formatter` over the consumed range; the size is returned unchanged.
    pub fn with_format(&self, formatter: &Formatter<D>) -> ValueWriter<D, T> {
        let w_inner = self.clone();
        let fmt_inner = formatter.clone();
        ValueWriter::new(move |doc, index, value: &T| {
            let size = w_inner.write(doc, index, value)?;
            fmt_inner.format(doc, SpecCellRange::new(index, size))?;
            Ok(size)
        })
    }

    /// Like [`Self::with_format`], passing the written value to the formatter.
    pub fn with_value_format(&self, formatter: &ValueFormatter<D, T>) -> ValueWriter<D, T> {
        let w_inner = self.clone();
        let fmt_inner = formatter.clone();
        ValueWriter::new(move |doc, index, value: &T| {
            let size = w_inner.write(doc, index, value)?;
            fmt_inner.format(doc, SpecCellRange::new(index, size), value)?;
            Ok(size)
        })
    }
}

// #endregion
////////////////////////////////////////////////////////////////////////////////
// #region Primitives

/// Single-cell writer for a scalar value; reports `(1, 1)`.
pub fn cell<D, T>() -> ValueWriter<D, T>
where
    D: CellDocument + 'static,
    T: CellScalar + 'static,
{
    ValueWriter::new(|doc: &mut D, index, value: &T| {
        doc.set_cell_value(index, value.to_cell_value())?;
        Ok(SpecCellSize::one())
    })
}

/// Writer that always puts `value` into one cell.
pub fn constant<D, T>(value: T) -> Writer<D>
where
    D: CellDocument + 'static,
    T: CellScalar + Send + Sync + 'static,
{
    cell::<D, T>().bind(value)
}

/// Single-cell writer for an optional value.
///
/// An absent value writes nothing but still reports `(1, 1)`, leaving a blank
/// placeholder. Use [`ValueWriter::optional`] to collapse absent content instead.
pub fn maybe_cell<D, T>() -> ValueWriter<D, Option<T>>
where
    D: CellDocument + 'static,
    T: CellScalar + 'static,
{
    let w_cell = cell::<D, T>();
    ValueWriter::new(move |doc, index, value: &Option<T>| {
        if let Some(val) = value {
            w_cell.write(doc, index, val)?;
        }
        Ok(SpecCellSize::one())
    })
}

/// Single-cell writer for a type only known to be `Any`.
///
/// Fails at composition time with [`GridWriteError::UnsupportedValueKind`] when
/// `T` is not one of the supported scalar types.
pub fn try_cell<D, T>() -> Result<ValueWriter<D, T>>
where
    D: CellDocument + 'static,
    T: Any,
{
    if !is_supported_scalar_type::<T>() {
        return Err(derive_unsupported_kind_error::<T>());
    }

    Ok(ValueWriter::new(|doc: &mut D, index, value: &T| {
        let value = derive_cell_value_from_any(value as &dyn Any)
            .ok_or_else(derive_unsupported_kind_error::<T>)?;
        doc.set_cell_value(index, value)?;
        Ok(SpecCellSize::one())
    }))
}

fn derive_unsupported_kind_error<T>() -> GridWriteError {
    GridWriteError::UnsupportedValueKind {
        kind: type_name::<T>().to_string(),
    }
}

// #endregion
////////////////////////////////////////////////////////////////////////////////
