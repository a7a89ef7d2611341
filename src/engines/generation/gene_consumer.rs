/// Reads a germinal vector as a circular tape.
///
/// Reading past the end wraps back to the start, so a short vector can still
/// drive an arbitrarily long derivation. `position` counts every read and is
/// never wrapped.
pub struct GeneConsumer<'a> {
    genome: &'a [f64],
    position: usize,
}

impl<'a> GeneConsumer<'a> {
    pub fn new(genome: &'a [f64]) -> Self {
        Self { genome, position: 0 }
    }

    /// Gene under the cursor.
    pub fn current(&self) -> f64 {
        if self.genome.is_empty() {
            return 0.0;
        }
        self.genome[self.position % self.genome.len()]
    }

    pub fn advance(&mut self) {
        self.position += 1;
    }

    /// Current gene, then advance.
    pub fn consume(&mut self) -> f64 {
        let gene = self.current();
        self.advance();
        gene
    }

    /// Number of times the tape has been wrapped.
    pub fn laps(&self) -> usize {
        if self.genome.is_empty() {
            return 0;
        }
        self.position / self.genome.len()
    }

    pub fn position(&self) -> usize {
        self.position
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_wraps_around() {
        let genome = [0.1, 0.2, 0.3];
        let mut consumer = GeneConsumer::new(&genome);
        let read: Vec<f64> = (0..7).map(|_| consumer.consume()).collect();
        assert_eq!(read, vec![0.1, 0.2, 0.3, 0.1, 0.2, 0.3, 0.1]);
        assert_eq!(consumer.position(), 7);
        assert_eq!(consumer.laps(), 2);
    }

    #[test]
    fn test_current_does_not_advance() {
        let genome = [0.5, 0.6];
        let mut consumer = GeneConsumer::new(&genome);
        assert_eq!(consumer.current(), 0.5);
        assert_eq!(consumer.current(), 0.5);
        consumer.advance();
        assert_eq!(consumer.current(), 0.6);
    }
}
