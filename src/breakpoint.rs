/// Line indexes at which `run` and `resume` pause, kept sorted.
#[derive(Clone, Debug, Default)]
pub struct Breakpoints(Vec<usize>);

impl Breakpoints {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn contains(&self, address: usize) -> bool {
        self.0.binary_search(&address).is_ok()
    }

    /// Returns `false` if a breakpoint already exists at `address`.
    pub fn insert(&mut self, address: usize) -> bool {
        match self.0.binary_search(&address) {
            Ok(_) => false,
            Err(index) => {
                self.0.insert(index, address);
                true
            }
        }
    }

    /// Returns whether a breakpoint was found with given address
    pub fn remove(&mut self, address: usize) -> bool {
        match self.0.binary_search(&address) {
            Ok(index) => {
                self.0.remove(index);
                true
            }
            Err(_) => false,
        }
    }

    pub fn clear(&mut self) {
        self.0.clear();
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn iter(&self) -> impl Iterator<Item = usize> + '_ {
        self.0.iter().copied()
    }
}

impl FromIterator<usize> for Breakpoints {
    fn from_iter<I: IntoIterator<Item = usize>>(iter: I) -> Self {
        let mut breakpoints = Self::new();
        for address in iter {
            breakpoints.insert(address);
        }
        breakpoints
    }
}

impl<'a> IntoIterator for &'a Breakpoints {
    type Item = usize;
    type IntoIter = std::iter::Copied<std::slice::Iter<'a, usize>>;
    fn into_iter(self) -> Self::IntoIter {
        self.0.iter().copied()
    }
}
