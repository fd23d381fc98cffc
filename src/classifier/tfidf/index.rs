use std::collections::HashMap;

/// A bag of terms: (term id, weight), sorted by term id.
type SparseVector = Vec<(usize, f32)>;

/// TF-IDF model over answer groups with cosine similarity lookup.
///
/// Weights are raw term frequency times `log2(N / df)`, L2-normalized; `N` counts groups
/// and `df` the groups containing the term. Terms present in every group weigh zero.
#[derive(Debug, Clone, Default)]
pub struct TfidfIndex {
    vocabulary: HashMap<String, usize>,
    idf: Vec<f32>,
    documents: Vec<SparseVector>,
}

impl TfidfIndex {
    /// Builds the index; `documents[i]` is the token bag of group `i`.
    pub fn build(documents: &[Vec<String>]) -> Self {
        let mut vocabulary: HashMap<String, usize> = HashMap::new();
        for token in documents.iter().flatten() {
            let next_id = vocabulary.len();
            vocabulary.entry(token.clone()).or_insert(next_id);
        }

        let mut document_frequency = vec![0usize; vocabulary.len()];
        let bags: Vec<HashMap<usize, u32>> = documents
            .iter()
            .map(|tokens| bag_of_words(&vocabulary, tokens))
            .collect();
        for bag in &bags {
            for &term in bag.keys() {
                document_frequency[term] += 1;
            }
        }

        let total = documents.len() as f32;
        let idf = document_frequency
            .iter()
            .map(|&df| if df == 0 { 0.0 } else { (total / df as f32).log2() })
            .collect();

        let mut index = Self {
            vocabulary,
            idf,
            documents: Vec::with_capacity(bags.len()),
        };
        let documents = bags.into_iter().map(|bag| index.weigh(bag)).collect();
        index.documents = documents;
        index
    }

    /// Cosine similarity of `tokens` to every group, in group order.
    ///
    /// Tokens outside the vocabulary are ignored; an unknown query scores `0.0` everywhere.
    pub fn similarities(&self, tokens: &[String]) -> Vec<f32> {
        let query = self.weigh(bag_of_words(&self.vocabulary, tokens));
        self.documents
            .iter()
            .map(|document| sparse_dot(&query, document))
            .collect()
    }

    pub fn vocabulary_len(&self) -> usize {
        self.vocabulary.len()
    }

    pub fn len(&self) -> usize {
        self.documents.len()
    }

    pub fn is_empty(&self) -> bool {
        self.documents.is_empty()
    }

    fn weigh(&self, bag: HashMap<usize, u32>) -> SparseVector {
        let mut vector: SparseVector = bag
            .into_iter()
            .map(|(term, tf)| (term, tf as f32 * self.idf[term]))
            .filter(|(_, weight)| *weight != 0.0)
            .collect();
        vector.sort_by_key(|(term, _)| *term);

        let norm = vector.iter().map(|(_, w)| w * w).sum::<f32>().sqrt();
        if norm > 0.0 {
            vector.iter_mut().for_each(|(_, w)| *w /= norm);
        }
        vector
    }
}

fn bag_of_words(vocabulary: &HashMap<String, usize>, tokens: &[String]) -> HashMap<usize, u32> {
    let mut bag = HashMap::new();
    for token in tokens {
        if let Some(&term) = vocabulary.get(token) {
            *bag.entry(term).or_insert(0) += 1;
        }
    }
    bag
}

/// Dot product of two id-sorted sparse vectors.
fn sparse_dot(a: &SparseVector, b: &SparseVector) -> f32 {
    let (mut i, mut j, mut dot) = (0, 0, 0.0);
    while i < a.len() && j < b.len() {
        match a[i].0.cmp(&b[j].0) {
            std::cmp::Ordering::Less => i += 1,
            std::cmp::Ordering::Greater => j += 1,
            std::cmp::Ordering::Equal => {
                dot += a[i].1 * b[j].1;
                i += 1;
                j += 1;
            }
        }
    }
    dot
}
