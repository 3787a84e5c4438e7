/// The paragraph stream ran out.
///
/// This is the normal end of a pass, not a failure.
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
#[error("end of paragraph stream")]
pub struct EndOfStream;

/// A forward-only reader over the flattened text of a document's paragraphs.
#[derive(Debug)]
pub struct ParagraphReader<I> {
    paragraphs: I,
    position: usize,
}

impl<I> ParagraphReader<I>
where
    I: Iterator<Item = String>,
{
    /// Wrap an ordered sequence of paragraph texts.
    pub fn new<P>(paragraphs: P) -> Self
    where
        P: IntoIterator<IntoIter = I>,
    {
        Self {
            paragraphs: paragraphs.into_iter(),
            position: 0,
        }
    }

    /// The number of paragraphs consumed so far.
    #[must_use]
    pub const fn position(&self) -> usize {
        self.position
    }

    /// Advance to the next paragraph and return its text.
    ///
    /// # Errors
    ///
    /// Returns [`EndOfStream`] if no paragraph remains.
    pub fn read_next(&mut self) -> Result<String, EndOfStream> {
        let text = self.paragraphs.next().ok_or(EndOfStream)?;
        self.position += 1;
        Ok(text)
    }

    /// Advance past one paragraph, returning what was discarded.
    ///
    /// # Errors
    ///
    /// Returns [`EndOfStream`] if no paragraph remains.
    pub fn skip_one(&mut self) -> Result<String, EndOfStream> {
        self.read_next()
    }

    /// Read the next paragraph, then discard the one after it.
    ///
    /// # Errors
    ///
    /// Returns [`EndOfStream`] if either paragraph is missing.
    pub fn read_next_skipping_one(&mut self) -> Result<String, EndOfStream> {
        let text = self.read_next()?;
        self.skip_one()?;
        Ok(text)
    }
}
