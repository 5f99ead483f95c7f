//! Ordered label set for model output decoding.
//!
//! The label order is the training order of the classifier and must stay
//! stable for the process lifetime: the model's output distribution is
//! decoded positionally, and argmax ties resolve to the lowest index.

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Label {
    /// Canonical class identifier, matches the training directory name.
    pub id: String,
    /// Human-facing name used in records and on screen.
    pub display: String,
}

#[derive(Debug, Clone)]
pub struct LabelSet {
    entries: Vec<Label>,
}

impl LabelSet {
    pub fn new(entries: Vec<Label>) -> Self {
        Self { entries }
    }

    /// The five-class set the shipped model was trained on, in training order.
    pub fn chess_pieces() -> Self {
        let entries = [
            ("bishop", "Bishop"),
            ("knight", "Knight"),
            ("pawn", "Pawn"),
            ("queen", "Queen"),
            ("rook", "Rook"),
        ]
        .iter()
        .map(|(id, display)| Label {
            id: (*id).to_string(),
            display: (*display).to_string(),
        })
        .collect();
        Self { entries }
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn get(&self, idx: usize) -> Option<&Label> {
        self.entries.get(idx)
    }

    pub fn iter(&self) -> impl Iterator<Item = &Label> {
        self.entries.iter()
    }

    /// Index of the largest value; ties go to the lowest index. `None` only
    /// for an empty distribution.
    pub fn argmax(distribution: &[f32]) -> Option<usize> {
        let mut best: Option<(usize, f32)> = None;
        for (idx, &p) in distribution.iter().enumerate() {
            match best {
                // Strictly greater keeps the first occurrence on ties.
                Some((_, max)) if p <= max => {}
                _ => best = Some((idx, p)),
            }
        }
        best.map(|(idx, _)| idx)
    }
}

impl Default for LabelSet {
    fn default() -> Self {
        Self::chess_pieces()
    }
}
