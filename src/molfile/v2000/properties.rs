//! The V2000 properties block: `M  XXX` commands plus the older `A  `,
//! `V  `, `G  ` and `S  SKP` lines, up to `M  END`.

use std::collections::HashMap;
use std::io::BufRead;

use petgraph::graph::{EdgeIndex, NodeIndex};

use crate::atom::{AtomKind, QueryAtom};
use crate::element::Element;
use crate::mol::Molecule;
use crate::sgroup::{
    AttachPoint, BracketStyle, Sgroup, SgroupBracket, SgroupId, SgroupKey, SgroupRegistry,
    SgroupType,
};

use crate::molfile::common::{self, BlockEnd};
use crate::molfile::error::{DiagnosticKind, Diagnostics, Result};
use crate::molfile::field::{read_coordinate, Columns};
use crate::molfile::source::LineSource;

struct Block<'a, R> {
    src: &'a mut LineSource<R>,
    diags: &'a mut Diagnostics,
    mol: &'a mut Molecule,
    registry: SgroupRegistry,
    /// `M  SCD` text waiting for its closing `M  SED`.
    pending_data: HashMap<SgroupId, String>,
}

pub(crate) fn read_block<R: BufRead>(
    src: &mut LineSource<R>,
    diags: &mut Diagnostics,
    mol: &mut Molecule,
) -> Result<BlockEnd> {
    let mut block = Block {
        src,
        diags,
        mol,
        registry: SgroupRegistry::default(),
        pending_data: HashMap::new(),
    };
    let end = block.run()?;
    block.flush_data();
    Ok(end)
}

impl<R: BufRead> Block<'_, R> {
    fn run(&mut self) -> Result<BlockEnd> {
        loop {
            let Some(line) = self.src.next_line()? else {
                return Ok(BlockEnd::Eof);
            };
            let cols = Columns::new(&line, self.src.number());
            let text = cols.line();
            if text.is_empty() {
                continue;
            }
            if text == "$$$$" {
                self.diags.warn(
                    DiagnosticKind::Format,
                    cols.number(),
                    "record ended without M  END",
                );
                return Ok(BlockEnd::Delimiter);
            }
            if text.starts_with("M  END") {
                return Ok(BlockEnd::End);
            }
            let tag = text.get(..6).unwrap_or(text);
            match tag {
                "M  CHG" => self.charges(&cols)?,
                "M  RAD" => self.radicals(&cols)?,
                "M  ISO" => self.isotopes(&cols)?,
                "M  RGP" => self.rgroups(&cols)?,
                "M  ALS" => self.atom_list(&cols)?,
                "M  STY" => self.sgroup_types(&cols)?,
                "M  SST" => self.sgroup_text(&cols, SgroupKey::Subtype)?,
                "M  SLB" => self.identifiers(&cols)?,
                "M  SCN" => self.sgroup_text(&cols, SgroupKey::Connectivity)?,
                "M  SAL" => self.sgroup_atoms(&cols, Member::Atom)?,
                "M  SBL" => self.sgroup_atoms(&cols, Member::Bond)?,
                "M  SPA" => self.sgroup_atoms(&cols, Member::ParentAtom)?,
                "M  SMT" => self.fixed_text(&cols, SgroupKey::Subscript)?,
                "M  SDI" => self.bracket(&cols)?,
                "M  SBT" => self.bracket_styles(&cols)?,
                "M  SPL" => self.parents(&cols)?,
                "M  SNC" => self.component_numbers(&cols)?,
                "M  SDS" => self.expansion(&cols)?,
                "M  SDT" => self.field_description(&cols)?,
                "M  SDD" => self.fixed_text(&cols, SgroupKey::DataDisplay)?,
                "M  SCD" => self.data(&cols, false)?,
                "M  SED" => self.data(&cols, true)?,
                "M  SCL" => self.fixed_text(&cols, SgroupKey::Class)?,
                "M  SAP" => self.attach_points(&cols)?,
                _ if text.starts_with("A  ") => self.alias(&cols)?,
                _ if text.starts_with("V  ") => self.value(&cols)?,
                _ if text.starts_with("G  ") => self.group(&cols)?,
                _ if text.starts_with("S  SKP") => {
                    let count = cols.int(6..9, 0, self.diags)?;
                    for _ in 0..count.max(0) {
                        if self.src.next_line()?.is_none() {
                            return Ok(BlockEnd::Eof);
                        }
                    }
                }
                _ => self.diags.unrecognized(cols.number(), tag),
            }
        }
    }

    /// Fixed-size entries after the count of a command such as
    /// `M  CHG  2   1  -1   3   1`.
    fn entries<'l>(&mut self, cols: &Columns<'l>, width: usize) -> Result<Vec<Vec<&'l str>>> {
        let mut tokens = cols.rest(6).split_whitespace();
        let Some(count) = tokens.next().and_then(|t| t.parse::<usize>().ok()) else {
            self.diags.field(cols.number(), 6..9, "missing entry count")?;
            return Ok(Vec::new());
        };
        let rest: Vec<&str> = tokens.collect();
        if rest.len() != count * width {
            self.diags.field(
                cols.number(),
                9..cols.len().max(10),
                format!("expected {count} entries of {width} values"),
            )?;
        }
        Ok(rest.chunks_exact(width).take(count).map(<[&str]>::to_vec).collect())
    }

    fn number(&mut self, cols: &Columns, token: &str) -> Result<Option<i64>> {
        match token.parse::<i64>() {
            Ok(n) => Ok(Some(n)),
            Err(_) => {
                self.diags
                    .recoverable(cols.number(), format!("invalid number '{token}'"))?;
                Ok(None)
            }
        }
    }

    fn atom(&mut self, cols: &Columns, token: &str) -> Result<Option<NodeIndex>> {
        let Some(n) = self.number(cols, token)? else {
            return Ok(None);
        };
        let found = usize::try_from(n).ok().and_then(|p| self.mol.atom_at(p));
        if found.is_none() {
            self.diags.recoverable(
                cols.number(),
                format!("atom {n} is not in the atom block"),
            )?;
        }
        Ok(found)
    }

    fn bond(&mut self, cols: &Columns, token: &str) -> Result<Option<EdgeIndex>> {
        let Some(n) = self.number(cols, token)? else {
            return Ok(None);
        };
        if n >= 1 && (n as usize) <= self.mol.bond_count() {
            return Ok(Some(EdgeIndex::new(n as usize - 1)));
        }
        self.diags
            .recoverable(cols.number(), format!("bond {n} is not in the bond block"))?;
        Ok(None)
    }

    fn sgroup(&mut self, cols: &Columns, token: &str) -> Result<Option<SgroupId>> {
        match self.number(cols, token)? {
            Some(n) if n > 0 => Ok(Some(common::ensure_sgroup(
                &mut self.registry,
                self.mol,
                self.diags,
                cols.number(),
                n as u32,
            ))),
            Some(n) => {
                self.diags
                    .recoverable(cols.number(), format!("invalid sgroup number {n}"))?;
                Ok(None)
            }
            None => Ok(None),
        }
    }

    /// Sgroup number in columns 8-10 of fixed-layout commands.
    fn fixed_sgroup(&mut self, cols: &Columns) -> Result<Option<SgroupId>> {
        let token = cols.text(7..10);
        self.sgroup(cols, token)
    }

    fn atom_values(&mut self, cols: &Columns) -> Result<Vec<(NodeIndex, i64)>> {
        let mut out = Vec::new();
        for entry in self.entries(cols, 2)? {
            let atom = self.atom(cols, entry[0])?;
            let value = self.number(cols, entry[1])?;
            if let (Some(atom), Some(value)) = (atom, value) {
                out.push((atom, value));
            }
        }
        Ok(out)
    }

    fn charges(&mut self, cols: &Columns) -> Result<()> {
        for (atom, charge) in self.atom_values(cols)? {
            match i8::try_from(charge) {
                Ok(q) => self.mol.atom_mut(atom).formal_charge = q,
                Err(_) => self
                    .diags
                    .recoverable(cols.number(), format!("charge {charge} out of range"))?,
            }
        }
        Ok(())
    }

    fn radicals(&mut self, cols: &Columns) -> Result<()> {
        for (atom, code) in self.atom_values(cols)? {
            match common::unpaired_from_radical(code) {
                Some(unpaired) => self.mol.atom_mut(atom).unpaired_electrons = unpaired,
                None => self
                    .diags
                    .recoverable(cols.number(), format!("invalid radical code {code}"))?,
            }
        }
        Ok(())
    }

    fn isotopes(&mut self, cols: &Columns) -> Result<()> {
        for (atom, mass) in self.atom_values(cols)? {
            match u16::try_from(mass) {
                Ok(m) if m > 0 => self.mol.atom_mut(atom).isotope = Some(m),
                _ => self
                    .diags
                    .recoverable(cols.number(), format!("invalid mass number {mass}"))?,
            }
        }
        Ok(())
    }

    fn rgroups(&mut self, cols: &Columns) -> Result<()> {
        for (atom, rgroup) in self.atom_values(cols)? {
            match u32::try_from(rgroup) {
                Ok(r) => {
                    let atom = self.mol.atom_mut(atom);
                    atom.rgroup = Some(r);
                    if matches!(atom.kind, AtomKind::Pseudo(_)) {
                        atom.kind = AtomKind::Pseudo("R#".to_string());
                    }
                }
                Err(_) => self
                    .diags
                    .recoverable(cols.number(), format!("invalid R-group {rgroup}"))?,
            }
        }
        Ok(())
    }

    /// `M  ALS aaannn e 11112222...`
    fn atom_list(&mut self, cols: &Columns) -> Result<()> {
        let token = cols.text(7..10);
        let Some(atom) = self.atom(cols, token)? else {
            return Ok(());
        };
        let count = cols.int(10..13, 0, self.diags)?.max(0) as usize;
        let negated = cols.text(14..15) == "T";
        let mut elements = Vec::with_capacity(count);
        for i in 0..count {
            let range = 16 + 4 * i..20 + 4 * i;
            let symbol = cols.text(range.clone());
            match Element::from_symbol(symbol) {
                Some(e) => elements.push(e),
                None => self.diags.field(
                    cols.number(),
                    range,
                    format!("invalid atom list element '{symbol}'"),
                )?,
            }
        }
        self.mol.atom_mut(atom).kind = AtomKind::Query(QueryAtom::List { elements, negated });
        Ok(())
    }

    /// `A  aaa` followed by the alias text on the next line.
    fn alias(&mut self, cols: &Columns) -> Result<()> {
        let token = cols.text(3..6);
        let atom = self.atom(cols, token)?;
        let label = self.src.expect_line()?;
        let label = label.trim();
        if let Some(atom) = atom {
            if !label.is_empty() {
                self.mol.atom_mut(atom).kind = AtomKind::Pseudo(label.to_string());
            }
        }
        Ok(())
    }

    /// `V  aaa text`
    fn value(&mut self, cols: &Columns) -> Result<()> {
        let token = cols.text(3..6);
        if let Some(atom) = self.atom(cols, token)? {
            let text = cols.rest(7).trim();
            self.mol.atom_mut(atom).value = Some(text.to_string());
        }
        Ok(())
    }

    /// `G  aaappp` followed by the group label: an abbreviation read as a
    /// Superatom Sgroup.
    fn group(&mut self, cols: &Columns) -> Result<()> {
        let token = cols.text(3..6);
        let atom = self.atom(cols, token)?;
        let label = self.src.expect_line()?;
        if let Some(atom) = atom {
            let mut sgroup = Sgroup::new(SgroupType::Superatom);
            sgroup.add_atom(atom);
            sgroup.put(SgroupKey::Subscript, label.trim());
            self.mol.add_sgroup(sgroup);
        }
        Ok(())
    }

    fn sgroup_types(&mut self, cols: &Columns) -> Result<()> {
        for entry in self.entries(cols, 2)? {
            let Some(n) = self.number(cols, entry[0])? else {
                continue;
            };
            let kind = match SgroupType::from_code(entry[1]) {
                Some(kind) => kind,
                None => {
                    self.diags.recoverable(
                        cols.number(),
                        format!("unknown sgroup type '{}'", entry[1]),
                    )?;
                    SgroupType::Generic
                }
            };
            match u32::try_from(n) {
                Ok(n) if n > 0 => {
                    self.registry.declare(self.mol.sgroups_mut(), n, kind);
                }
                _ => self
                    .diags
                    .recoverable(cols.number(), format!("invalid sgroup number {n}"))?,
            }
        }
        Ok(())
    }

    /// Pairs of sgroup number and a text value (`SST`, `SCN`).
    fn sgroup_text(&mut self, cols: &Columns, key: SgroupKey) -> Result<()> {
        for entry in self.entries(cols, 2)? {
            if let Some(id) = self.sgroup(cols, entry[0])? {
                self.mol.sgroup_mut(id).put(key, entry[1]);
            }
        }
        Ok(())
    }

    /// `M  SAL sssn15 aaa ...` and the bond and parent-atom variants.
    fn sgroup_atoms(&mut self, cols: &Columns, member: Member) -> Result<()> {
        let tokens: Vec<&str> = cols.rest(6).split_whitespace().collect();
        let [number, count, items @ ..] = tokens.as_slice() else {
            self.diags
                .recoverable(cols.number(), "sgroup member list is incomplete")?;
            return Ok(());
        };
        let Some(id) = self.sgroup(cols, number)? else {
            return Ok(());
        };
        if count.parse::<usize>().ok() != Some(items.len()) {
            self.diags.field(
                cols.number(),
                10..13,
                format!("member count {count} does not match {} entries", items.len()),
            )?;
        }
        for item in items {
            match member {
                Member::Atom | Member::ParentAtom => {
                    if let Some(atom) = self.atom(cols, item)? {
                        let sgroup = self.mol.sgroup_mut(id);
                        if member == Member::Atom {
                            sgroup.add_atom(atom);
                        } else {
                            sgroup.add_parent_atom(atom);
                        }
                    }
                }
                Member::Bond => {
                    if let Some(bond) = self.bond(cols, item)? {
                        self.mol.sgroup_mut(id).add_bond(bond);
                    }
                }
            }
        }
        Ok(())
    }

    /// Commands with the sgroup number in columns 8-10 and free text from
    /// column 12 (`SMT`, `SDD`, `SCL`).
    fn fixed_text(&mut self, cols: &Columns, key: SgroupKey) -> Result<()> {
        if let Some(id) = self.fixed_sgroup(cols)? {
            let text = match key {
                SgroupKey::DataDisplay => cols.rest(11),
                _ => cols.rest(11).trim(),
            };
            self.mol.sgroup_mut(id).put(key, text);
        }
        Ok(())
    }

    /// `M  SDI sssnn4 x1 y1 x2 y2`
    fn bracket(&mut self, cols: &Columns) -> Result<()> {
        let Some(id) = self.fixed_sgroup(cols)? else {
            return Ok(());
        };
        let count = cols.int(10..13, 0, self.diags)?;
        if count != 4 {
            self.diags
                .field(cols.number(), 10..13, format!("bracket needs 4 values, found {count}"))?;
            return Ok(());
        }
        let mut values = [0.0; 4];
        let tokens: Vec<&str> = cols.rest(13).split_whitespace().collect();
        for (i, value) in values.iter_mut().enumerate() {
            let range = 13 + 10 * i..23 + 10 * i;
            *value = match read_coordinate(cols.text(range.clone())) {
                Some(v) => v,
                None => match tokens.get(i).and_then(|t| read_coordinate(t)) {
                    Some(v) if tokens.len() == 4 => v,
                    _ => {
                        self.diags
                            .field(cols.number(), range, "invalid bracket coordinate")?;
                        0.0
                    }
                },
            };
        }
        self.mol.sgroup_mut(id).add_bracket(SgroupBracket {
            start: [values[0], values[1]],
            end: [values[2], values[3]],
        });
        Ok(())
    }

    fn identifiers(&mut self, cols: &Columns) -> Result<()> {
        for entry in self.entries(cols, 2)? {
            let Some(id) = self.sgroup(cols, entry[0])? else {
                continue;
            };
            match self.number(cols, entry[1])? {
                Some(label) if label > 0 => {
                    self.mol.sgroup_mut(id).put(SgroupKey::Identifier, label as u32)
                }
                Some(_) | None => {}
            }
        }
        Ok(())
    }

    fn bracket_styles(&mut self, cols: &Columns) -> Result<()> {
        for entry in self.entries(cols, 2)? {
            let Some(id) = self.sgroup(cols, entry[0])? else {
                continue;
            };
            let style = match entry[1] {
                "0" => BracketStyle::Square,
                "1" => BracketStyle::Round,
                other => {
                    self.diags
                        .recoverable(cols.number(), format!("invalid bracket style '{other}'"))?;
                    continue;
                }
            };
            self.mol.sgroup_mut(id).put(SgroupKey::BracketStyle, style);
        }
        Ok(())
    }

    fn parents(&mut self, cols: &Columns) -> Result<()> {
        for entry in self.entries(cols, 2)? {
            let child = self.sgroup(cols, entry[0])?;
            let parent = self.sgroup(cols, entry[1])?;
            if let (Some(child), Some(parent)) = (child, parent) {
                common::link_parent(self.mol, self.diags, cols.number(), child, parent)?;
            }
        }
        Ok(())
    }

    fn component_numbers(&mut self, cols: &Columns) -> Result<()> {
        for entry in self.entries(cols, 2)? {
            let id = self.sgroup(cols, entry[0])?;
            let n = self.number(cols, entry[1])?;
            if let (Some(id), Some(n)) = (id, n) {
                match u32::try_from(n) {
                    Ok(n) => self.mol.sgroup_mut(id).put(SgroupKey::ComponentNumber, n),
                    Err(_) => self
                        .diags
                        .recoverable(cols.number(), format!("invalid component number {n}"))?,
                }
            }
        }
        Ok(())
    }

    /// `M  SDS EXPn15 sss ...`
    fn expansion(&mut self, cols: &Columns) -> Result<()> {
        if cols.text(7..10) != "EXP" {
            self.diags.unrecognized(cols.number(), cols.line());
            return Ok(());
        }
        let mut tokens = cols.rest(10).split_whitespace();
        let _count = tokens.next();
        for token in tokens {
            if let Some(id) = self.sgroup(cols, token)? {
                self.mol.sgroup_mut(id).put(SgroupKey::Expansion, true);
            }
        }
        Ok(())
    }

    /// `M  SDT sss fieldname(30) format(2) units(20)`
    fn field_description(&mut self, cols: &Columns) -> Result<()> {
        let Some(id) = self.fixed_sgroup(cols)? else {
            return Ok(());
        };
        let sgroup = self.mol.sgroup_mut(id);
        for (key, range) in [
            (SgroupKey::FieldName, 11..41),
            (SgroupKey::FieldFormat, 41..43),
            (SgroupKey::FieldUnits, 43..63),
        ] {
            let text = cols.text(range);
            if !text.is_empty() {
                sgroup.put(key, text);
            }
        }
        Ok(())
    }

    /// `M  SCD` continues and `M  SED` ends the data of a data Sgroup.
    fn data(&mut self, cols: &Columns, last: bool) -> Result<()> {
        let Some(id) = self.fixed_sgroup(cols)? else {
            return Ok(());
        };
        let chunk = cols.rest(11);
        let text = self.pending_data.entry(id).or_default();
        text.push_str(chunk);
        if last {
            if let Some(text) = self.pending_data.remove(&id) {
                self.mol
                    .sgroup_mut(id)
                    .put(SgroupKey::Data, text.trim_end().to_string());
            }
        }
        Ok(())
    }

    /// `M  SAP sssnn6 iii ooo cc ...`
    fn attach_points(&mut self, cols: &Columns) -> Result<()> {
        let tokens: Vec<&str> = cols.rest(6).split_whitespace().collect();
        let [number, _count, items @ ..] = tokens.as_slice() else {
            self.diags
                .recoverable(cols.number(), "attachment point list is incomplete")?;
            return Ok(());
        };
        let Some(id) = self.sgroup(cols, number)? else {
            return Ok(());
        };
        if items.len() % 3 != 0 {
            self.diags
                .recoverable(cols.number(), "attachment points need atom, leaving atom and id")?;
        }
        for triple in items.chunks_exact(3) {
            let Some(atom) = self.atom(cols, triple[0])? else {
                continue;
            };
            let leaving = match triple[1] {
                "0" => None,
                token => self.atom(cols, token)?,
            };
            self.mol.sgroup_mut(id).add_attach_point(AttachPoint {
                atom,
                leaving,
                id: triple[2].to_string(),
            });
        }
        Ok(())
    }

    /// Data started with `M  SCD` but never closed keeps what was read.
    fn flush_data(&mut self) {
        for (id, text) in self.pending_data.drain() {
            self.mol
                .sgroup_mut(id)
                .put(SgroupKey::Data, text.trim_end().to_string());
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Member {
    Atom,
    Bond,
    ParentAtom,
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::atom::Atom;
    use crate::bond::Bond;
    use crate::molfile::error::Severity;
    use crate::molfile::options::Mode;

    fn chain(n: usize) -> Molecule {
        let mut mol = Molecule::new();
        let atoms: Vec<_> = (0..n).map(|_| mol.add_atom(Atom::new(Element::C))).collect();
        for pair in atoms.windows(2) {
            mol.add_bond(pair[0], pair[1], Bond::default());
        }
        mol
    }

    fn read(mol: &mut Molecule, text: &str, mode: Mode) -> (Result<BlockEnd>, Diagnostics) {
        let mut src = LineSource::new(text.as_bytes());
        let mut diags = Diagnostics::new(mode);
        let end = read_block(&mut src, &mut diags, mol);
        (end, diags)
    }

    fn atom(mol: &Molecule, position: usize) -> &Atom {
        mol.atom(NodeIndex::new(position - 1))
    }

    #[test]
    fn atom_properties() {
        let mut mol = chain(4);
        let text = "M  CHG  2   1  -1   3   2\nM  ISO  1   2  13\nM  RAD  1   4   2\nM  END\n";
        let (end, mut diags) = read(&mut mol, text, Mode::Strict);
        assert_eq!(end.unwrap(), BlockEnd::End);
        assert!(diags.take().is_empty());
        assert_eq!(atom(&mol, 1).formal_charge, -1);
        assert_eq!(atom(&mol, 3).formal_charge, 2);
        assert_eq!(atom(&mol, 2).isotope, Some(13));
        assert_eq!(atom(&mol, 4).unpaired_electrons, 1);
    }

    #[test]
    fn zero_padded_atom_numbers() {
        let mut mol = chain(2);
        let (end, _) = read(&mut mol, "M  CHG  1 002  -1\n", Mode::Strict);
        assert_eq!(end.unwrap(), BlockEnd::Eof);
        assert_eq!(atom(&mol, 2).formal_charge, -1);
    }

    #[test]
    fn atom_list_alias_value() {
        let mut mol = chain(3);
        let text = "M  ALS   1  2 T N   O   \nA    2\nPh\nV    3 some text\nM  END\n";
        let (end, _) = read(&mut mol, text, Mode::Strict);
        assert_eq!(end.unwrap(), BlockEnd::End);
        assert_eq!(
            atom(&mol, 1).kind,
            AtomKind::Query(QueryAtom::List {
                elements: vec![Element::N, Element::O],
                negated: true
            })
        );
        assert_eq!(atom(&mol, 2).kind, AtomKind::Pseudo("Ph".to_string()));
        assert_eq!(atom(&mol, 3).value.as_deref(), Some("some text"));
    }

    #[test]
    fn unknown_commands_are_skipped() {
        let mut mol = chain(1);
        let (end, mut diags) = read(&mut mol, "M  ZZZ  1   1   1\nM  END\n", Mode::Strict);
        assert_eq!(end.unwrap(), BlockEnd::End);
        let items = diags.take();
        assert_eq!(items.len(), 1);
        assert_eq!(items[0].kind, DiagnosticKind::UnrecognizedCommand);
    }

    #[test]
    fn skip_lines() {
        let mut mol = chain(1);
        let text = "S  SKP  2\nM  CHG  1   1   1\nM  CHG  1   1   1\nM  END\n";
        let (end, _) = read(&mut mol, text, Mode::Strict);
        assert_eq!(end.unwrap(), BlockEnd::End);
        assert_eq!(atom(&mol, 1).formal_charge, 0);
    }

    #[test]
    fn polymer_sgroups() {
        let mut mol = chain(4);
        let text = "\
M  STY  2   1 SRU   2 COP
M  SST  1   2 RAN
M  SLB  2   1  11   2   0
M  SAL   1  2   2   3
M  SBL   1  2   1   3
M  SCN  1   1 HT
M  SMT   1 n
M  SDI   1  4    1.0000    2.0000    1.0000   -2.0000
M  SBT  1   1   1
M  SPL  1   1   2
M  SNC  1   1   3
M  SDS EXP  1   1
M  END
";
        let (end, mut diags) = read(&mut mol, text, Mode::Strict);
        assert_eq!(end.unwrap(), BlockEnd::End);
        assert!(diags.take().is_empty());
        assert_eq!(mol.sgroups().len(), 2);

        let sru = &mol.sgroups()[0];
        assert_eq!(sru.kind, SgroupType::Sru);
        assert_eq!(sru.atoms(), &[NodeIndex::new(1), NodeIndex::new(2)]);
        assert_eq!(sru.bonds(), &[EdgeIndex::new(0), EdgeIndex::new(2)]);
        assert_eq!(sru.text(SgroupKey::Connectivity), Some("HT"));
        assert_eq!(sru.subscript(), Some("n"));
        assert_eq!(
            sru.brackets(),
            &[SgroupBracket {
                start: [1.0, 2.0],
                end: [1.0, -2.0]
            }]
        );
        assert_eq!(sru.bracket_style(), Some(BracketStyle::Round));
        assert_eq!(sru.parents(), &[SgroupId(1)]);
        assert_eq!(sru.number(SgroupKey::ComponentNumber), Some(3));
        assert!(sru.flag(SgroupKey::Expansion));
        assert_eq!(sru.number(SgroupKey::Identifier), Some(11));

        let cop = &mol.sgroups()[1];
        assert_eq!(cop.kind, SgroupType::Copolymer);
        assert_eq!(cop.number(SgroupKey::Identifier), None);
        assert_eq!(cop.text(SgroupKey::Subtype), Some("RAN"));
    }

    #[test]
    fn data_sgroup() {
        let mut mol = chain(2);
        let text = [
            "M  STY  1   1 DAT".to_string(),
            "M  SAL   1  1   1".to_string(),
            format!("M  SDT   1 {:<30}{:<2}{}", "pKa", "N", "unit"),
            "M  SDD   1     0.5000    0.2500    DA    ALL  1       5".to_string(),
            "M  SCD   1 first part ".to_string(),
            "M  SED   1 second part".to_string(),
            "M  END".to_string(),
        ]
        .join("\n");
        let text = text.as_str();
        let (end, _) = read(&mut mol, text, Mode::Strict);
        assert_eq!(end.unwrap(), BlockEnd::End);
        let dat = &mol.sgroups()[0];
        assert_eq!(dat.kind, SgroupType::Data);
        assert_eq!(dat.text(SgroupKey::FieldName), Some("pKa"));
        assert_eq!(dat.text(SgroupKey::FieldFormat), Some("N"));
        assert_eq!(dat.text(SgroupKey::FieldUnits), Some("unit"));
        assert_eq!(dat.text(SgroupKey::Data), Some("first part second part"));
        assert!(dat.text(SgroupKey::DataDisplay).is_some());
    }

    #[test]
    fn superatom_with_attachment() {
        let mut mol = chain(3);
        let text = "\
M  STY  1   1 SUP
M  SAL   1  2   2   3
M  SMT   1 Et
M  SAP   1  1   2   1 1
M  SCL   1 LGRP
G    3  1
OMe
M  END
";
        let (end, _) = read(&mut mol, text, Mode::Strict);
        assert_eq!(end.unwrap(), BlockEnd::End);
        let sup = &mol.sgroups()[0];
        assert_eq!(sup.subscript(), Some("Et"));
        assert_eq!(sup.text(SgroupKey::Class), Some("LGRP"));
        assert_eq!(
            sup.attach_points(),
            &[AttachPoint {
                atom: NodeIndex::new(1),
                leaving: Some(NodeIndex::new(0)),
                id: "1".to_string()
            }]
        );
        let abbreviation = &mol.sgroups()[1];
        assert_eq!(abbreviation.kind, SgroupType::Superatom);
        assert_eq!(abbreviation.subscript(), Some("OMe"));
        assert_eq!(abbreviation.atoms(), &[NodeIndex::new(2)]);
    }

    #[test]
    fn reference_before_declaration() {
        let mut mol = chain(2);
        let text = "M  SAL   1  1   1\nM  STY  1   1 SUP\nM  END\n";
        let (end, mut diags) = read(&mut mol, text, Mode::Strict);
        assert_eq!(end.unwrap(), BlockEnd::End);
        let items = diags.take();
        assert_eq!(items.len(), 1);
        assert_eq!(items[0].kind, DiagnosticKind::SgroupOrder);
        assert_eq!(items[0].severity, Severity::Error);
        assert_eq!(mol.sgroups()[0].kind, SgroupType::Superatom);
        assert_eq!(mol.sgroups()[0].atoms(), &[NodeIndex::new(0)]);
    }

    #[test]
    fn parent_cycles() {
        let text = "M  STY  2   1 GEN   2 GEN\nM  SPL  2   1   2   2   1\nM  END\n";

        let mut relaxed = chain(1);
        let (end, mut diags) = read(&mut relaxed, text, Mode::Relaxed);
        assert_eq!(end.unwrap(), BlockEnd::End);
        assert_eq!(diags.take()[0].kind, DiagnosticKind::SgroupOrder);
        assert_eq!(relaxed.sgroups()[0].parents(), &[SgroupId(1)]);
        assert!(relaxed.sgroups()[1].parents().is_empty());

        let mut strict = chain(1);
        let (end, _) = read(&mut strict, text, Mode::Strict);
        assert!(end.is_err());
    }

    #[test]
    fn delimiter_without_end() {
        let mut mol = chain(1);
        let (end, mut diags) = read(&mut mol, "M  CHG  1   1   1\n$$$$\n", Mode::Relaxed);
        assert_eq!(end.unwrap(), BlockEnd::Delimiter);
        assert_eq!(diags.take()[0].kind, DiagnosticKind::Format);
    }

    #[test]
    fn out_of_range_atoms() {
        let mut relaxed = chain(1);
        let (end, mut diags) = read(&mut relaxed, "M  CHG  1   5   1\nM  END\n", Mode::Relaxed);
        assert_eq!(end.unwrap(), BlockEnd::End);
        assert_eq!(diags.take().len(), 1);

        let mut strict = chain(1);
        let (end, _) = read(&mut strict, "M  CHG  1   5   1\nM  END\n", Mode::Strict);
        assert!(end.is_err());
    }
}
