use std::collections::HashMap;
use std::io::BufRead;

use petgraph::graph::{EdgeIndex, NodeIndex};

use crate::atom::{Atom, Parity, QueryAtom};
use crate::bond::{Bond, BondOrder, BondStereo};
use crate::element::Element;
use crate::mol::Molecule;
use crate::sgroup::{
    AttachPoint, BracketStyle, Sgroup, SgroupBracket, SgroupKey, SgroupRegistry, SgroupType,
};

use crate::molfile::common::{self, BlockEnd};
use crate::molfile::error::{DiagnosticKind, Diagnostics, MolfileError, Result};
use crate::molfile::field::read_coordinate;
use crate::molfile::options::ReaderOptions;
use crate::molfile::source::LineSource;
use crate::molfile::tagged::{self, Line};

/// Atom attributes read and dropped.
const IGNORED_ATOM_KEYS: [&str; 11] = [
    "HCOUNT", "STBOX", "INVRET", "EXACHG", "SUBST", "UNSAT", "RBCNT", "ATTCHPT", "ATTCHORD",
    "CLASS", "SEQID",
];

const IGNORED_BOND_KEYS: [&str; 4] = ["STBOX", "TOPO", "RXCTR", "DISP"];

const IGNORED_SGROUP_KEYS: [&str; 8] = [
    "SEQID", "XBHEAD", "XBCORR", "CSTATE", "DISPLAY", "QUERYTYPE", "QUERYOP", "TEMPLATE",
];

struct Ctab<'a, R> {
    src: &'a mut LineSource<R>,
    diags: &'a mut Diagnostics,
    options: &'a ReaderOptions,
    mol: &'a mut Molecule,
    atoms: HashMap<u32, NodeIndex>,
    bonds: HashMap<u32, EdgeIndex>,
    registry: SgroupRegistry,
}

/// Reads the tagged connection table that follows a V3000 counts line, up
/// to and including `M  END`.
pub(crate) fn read_ctab<R: BufRead>(
    src: &mut LineSource<R>,
    diags: &mut Diagnostics,
    options: &ReaderOptions,
    mol: &mut Molecule,
) -> Result<BlockEnd> {
    Ctab {
        src,
        diags,
        options,
        mol,
        atoms: HashMap::new(),
        bonds: HashMap::new(),
        registry: SgroupRegistry::default(),
    }
    .run()
}

fn parse_index(line: usize, token: &str, what: &str) -> Result<u32> {
    token
        .parse::<u32>()
        .ok()
        .filter(|&n| n > 0)
        .ok_or_else(|| MolfileError::parse(line, format!("invalid {what} index '{token}'")))
}

impl<R: BufRead> Ctab<'_, R> {
    fn run(mut self) -> Result<BlockEnd> {
        loop {
            match tagged::read_line(self.src)? {
                Line::End { .. } => return Ok(BlockEnd::End),
                Line::Other { line, text } => {
                    let text = text.trim_end();
                    if text == "$$$$" {
                        self.diags
                            .warn(DiagnosticKind::Format, line, "record ended without M  END");
                        return Ok(BlockEnd::Delimiter);
                    }
                    if !text.is_empty() {
                        self.diags.unrecognized(line, text.get(..6).unwrap_or(text));
                    }
                }
                Line::Command { line, text } => {
                    let tokens = tagged::tokens(&text);
                    match tokens.as_slice() {
                        ["BEGIN", "CTAB"] | ["END", "CTAB"] => {}
                        ["COUNTS", rest @ ..] => {
                            if rest.len() < 2 {
                                self.diags.recoverable(line, "COUNTS needs atom and bond counts")?;
                            }
                            self.mol.chiral = rest.get(4) == Some(&"1");
                        }
                        ["BEGIN", "ATOM"] => self.atom_block()?,
                        ["BEGIN", "BOND"] => self.bond_block()?,
                        ["BEGIN", "SGROUP"] => self.sgroup_block()?,
                        ["BEGIN", name, ..] => self.skip_block(line, name)?,
                        _ => self
                            .diags
                            .unrecognized(line, tokens.first().copied().unwrap_or("")),
                    }
                }
            }
        }
    }

    /// Logical lines up to `END <name>`.
    fn block(&mut self, name: &str) -> Result<Vec<(usize, String)>> {
        let mut lines = Vec::new();
        loop {
            match tagged::read_line(self.src)? {
                Line::Command { line, text } => {
                    let tokens = tagged::tokens(&text);
                    if tokens.len() == 2 && tokens[0] == "END" && tokens[1] == name {
                        return Ok(lines);
                    }
                    lines.push((line, text));
                }
                Line::End { line } => {
                    return Err(MolfileError::parse(line, format!("M  END inside the {name} block")))
                }
                Line::Other { line, text } => {
                    if !text.trim().is_empty() {
                        self.diags.unrecognized(line, text.get(..6).unwrap_or(&text));
                    }
                }
            }
        }
    }

    fn skip_block(&mut self, line: usize, name: &str) -> Result<()> {
        self.diags.warn(
            DiagnosticKind::UnrecognizedCommand,
            line,
            format!("skipping {name} block"),
        );
        let name = name.to_string();
        let skipped = self.block(&name)?;
        log::debug!("skipped {} lines of the {name} block", skipped.len());
        Ok(())
    }

    fn int(&mut self, line: usize, key: &str, value: &str) -> Result<Option<i64>> {
        match value.parse::<i64>() {
            Ok(n) => Ok(Some(n)),
            Err(_) => {
                self.diags
                    .recoverable(line, format!("invalid {key} value '{value}'"))?;
                Ok(None)
            }
        }
    }

    fn list<'t>(&mut self, line: usize, key: &str, value: &'t str) -> Result<Vec<&'t str>> {
        match tagged::list(value) {
            Ok(items) => Ok(items),
            Err(message) => {
                self.diags.recoverable(line, format!("{key}: {message}"))?;
                Ok(Vec::new())
            }
        }
    }

    fn atom_ref(&mut self, line: usize, token: &str) -> Result<Option<NodeIndex>> {
        let found = token.parse::<u32>().ok().and_then(|n| self.atoms.get(&n).copied());
        if found.is_none() {
            self.diags
                .recoverable(line, format!("reference to unknown atom '{token}'"))?;
        }
        Ok(found)
    }

    fn bond_ref(&mut self, line: usize, token: &str) -> Result<Option<EdgeIndex>> {
        let found = token.parse::<u32>().ok().and_then(|n| self.bonds.get(&n).copied());
        if found.is_none() {
            self.diags
                .recoverable(line, format!("reference to unknown bond '{token}'"))?;
        }
        Ok(found)
    }

    fn atom_block(&mut self) -> Result<()> {
        let lines = self.block("ATOM")?;
        let mut points = Vec::with_capacity(lines.len());
        for (line, text) in &lines {
            let (index, atom, point) = self.atom(*line, text)?;
            let idx = self.mol.add_atom(atom);
            if self.atoms.insert(index, idx).is_some() {
                return Err(MolfileError::parse(*line, format!("atom index {index} repeats")));
            }
            points.push(point);
        }
        common::place_atoms(self.mol, &points);
        log::trace!("read {} atoms", lines.len());
        Ok(())
    }

    /// `index type x y z aamap [KEY=value ...]`
    fn atom(&mut self, line: usize, text: &str) -> Result<(u32, Atom, [f64; 3])> {
        let tokens = tagged::tokens(text);
        let mut iter = tokens.iter().copied();
        let index = parse_index(line, iter.next().unwrap_or(""), "atom")?;
        let mut kind = iter.next().unwrap_or("");
        let negated = kind.eq_ignore_ascii_case("NOT");
        if negated {
            kind = iter.next().unwrap_or("");
        }
        let rest: Vec<&str> = iter.collect();
        if rest.len() < 4 {
            return Err(MolfileError::parse(
                line,
                "atom line needs a type, three coordinates and a map number",
            ));
        }

        let mut atom = if let Some(inner) = kind.strip_prefix('[').and_then(|k| k.strip_suffix(']')) {
            let mut elements = Vec::new();
            for symbol in inner.split(',').map(str::trim) {
                match Element::from_symbol(symbol) {
                    Some(e) => elements.push(e),
                    None => self
                        .diags
                        .recoverable(line, format!("unknown element '{symbol}' in atom list"))?,
                }
            }
            Atom::query(QueryAtom::List { elements, negated })
        } else if kind.starts_with('"') {
            Atom::pseudo(tagged::unquote(kind).into_owned())
        } else {
            common::atom_from_symbol(kind, line, self.diags, self.options)?
        };

        let mut point = [0.0; 3];
        for (value, token) in point.iter_mut().zip(&rest[..3]) {
            *value = match read_coordinate(token) {
                Some(v) => v,
                None => {
                    self.diags
                        .recoverable(line, format!("invalid coordinate '{token}'"))?;
                    0.0
                }
            };
        }
        if let Some(map) = self.int(line, "map", rest[3])? {
            if map > 0 {
                atom.atom_map = map as u32;
            }
        }

        for token in &rest[4..] {
            let Some((key, value)) = tagged::attribute(token) else {
                self.diags
                    .recoverable(line, format!("malformed attribute '{token}'"))?;
                continue;
            };
            match key.as_str() {
                "CHG" => {
                    if let Some(n) = self.int(line, &key, value)? {
                        match i8::try_from(n) {
                            Ok(c) => atom.formal_charge = c,
                            Err(_) => self.diags.recoverable(line, format!("charge {n} is out of range"))?,
                        }
                    }
                }
                "RAD" => {
                    if let Some(n) = self.int(line, &key, value)? {
                        match common::unpaired_from_radical(n) {
                            Some(e) => atom.unpaired_electrons = e,
                            None => self.diags.recoverable(line, format!("invalid radical {n}"))?,
                        }
                    }
                }
                "CFG" => {
                    if let Some(n) = self.int(line, &key, value)? {
                        match u32::try_from(n).ok().and_then(Parity::from_code) {
                            Some(p) => atom.parity = p,
                            None => self.diags.recoverable(line, format!("invalid parity {n}"))?,
                        }
                    }
                }
                "MASS" => {
                    if let Some(n) = self.int(line, &key, value)? {
                        match u16::try_from(n) {
                            Ok(m) if m > 0 => atom.isotope = Some(m),
                            _ => self.diags.recoverable(line, format!("invalid mass {n}"))?,
                        }
                    }
                }
                "VAL" => {
                    if let Some(n) = self.int(line, &key, value)? {
                        let valence = match n {
                            -1 => Some(0),
                            0 => None,
                            n => u8::try_from(n).ok(),
                        };
                        match valence {
                            Some(v) => {
                                if !atom.set_valence(v) {
                                    log::debug!("line {line}: valence ignored on non-element atom");
                                }
                            }
                            None if n == 0 => {}
                            None => self.diags.recoverable(line, format!("invalid valence {n}"))?,
                        }
                    }
                }
                "RGROUPS" => {
                    let items = self.list(line, &key, value)?;
                    if let Some(first) = items.first() {
                        if let Some(r) = self.int(line, &key, first)? {
                            atom.rgroup = u32::try_from(r).ok();
                        }
                    }
                }
                k if IGNORED_ATOM_KEYS.contains(&k) => {
                    log::debug!("line {line}: ignoring atom attribute {k}");
                }
                _ => self.diags.unrecognized(line, &key),
            }
        }
        Ok((index, atom, point))
    }

    fn bond_block(&mut self) -> Result<()> {
        let lines = self.block("BOND")?;
        for (line, text) in &lines {
            self.bond(*line, text)?;
        }
        log::trace!("read {} bonds", lines.len());
        Ok(())
    }

    /// `index type atom1 atom2 [KEY=value ...]`
    fn bond(&mut self, line: usize, text: &str) -> Result<()> {
        let tokens = tagged::tokens(text);
        let [index, kind, a1, a2, attrs @ ..] = tokens.as_slice() else {
            return Err(MolfileError::parse(line, "bond line needs an index, a type and two atoms"));
        };
        let index = parse_index(line, index, "bond")?;
        let mut ends = [NodeIndex::end(); 2];
        for (end, token) in ends.iter_mut().zip([a1, a2]) {
            *end = token
                .parse::<u32>()
                .ok()
                .and_then(|n| self.atoms.get(&n).copied())
                .ok_or_else(|| MolfileError::parse(line, format!("bond references unknown atom '{token}'")))?;
        }
        let [begin, end] = ends;
        if begin == end {
            return Err(MolfileError::parse(line, "bond joins an atom to itself"));
        }
        let order = match kind.parse::<u32>().ok().and_then(BondOrder::from_code) {
            Some(order) => order,
            None => {
                self.diags
                    .recoverable(line, format!("invalid bond type '{kind}'"))?;
                BondOrder::Single
            }
        };

        let mut cfg = 0;
        let mut endpoints = Vec::new();
        let mut attach = None;
        for token in attrs {
            let Some((key, value)) = tagged::attribute(token) else {
                self.diags
                    .recoverable(line, format!("malformed attribute '{token}'"))?;
                continue;
            };
            match key.as_str() {
                "CFG" => cfg = self.int(line, &key, value)?.unwrap_or(0),
                "ENDPTS" => {
                    for item in self.list(line, &key, value)? {
                        if let Some(atom) = self.atom_ref(line, item)? {
                            endpoints.push(atom);
                        }
                    }
                }
                "ATTACH" => attach = Some(value.to_string()),
                k if IGNORED_BOND_KEYS.contains(&k) => {
                    log::debug!("line {line}: ignoring bond attribute {k}");
                }
                _ => self.diags.unrecognized(line, &key),
            }
        }

        let stereo = match (order, cfg) {
            (BondOrder::Double, 0) => BondStereo::EZByCoordinates,
            (BondOrder::Double, 2) => BondStereo::EOrZ,
            (_, 0) => BondStereo::None,
            (BondOrder::Single, 1) => BondStereo::Up,
            (BondOrder::Single, 2) => BondStereo::UpOrDown,
            (BondOrder::Single, 3) => BondStereo::Down,
            _ => {
                self.diags
                    .recoverable(line, format!("CFG={cfg} does not apply to bond type {kind}"))?;
                BondStereo::None
            }
        };

        let mut bond = Bond::new(order);
        bond.stereo = stereo;
        if order == BondOrder::Aromatic {
            bond.is_aromatic = true;
            self.mol.atom_mut(begin).is_aromatic = true;
            self.mol.atom_mut(end).is_aromatic = true;
        }
        let edge = self.mol.add_bond(begin, end, bond);
        if self.bonds.insert(index, edge).is_some() {
            return Err(MolfileError::parse(line, format!("bond index {index} repeats")));
        }

        if !endpoints.is_empty() {
            let mut group = Sgroup::new(SgroupType::ExtMulticenter);
            for atom in endpoints {
                group.add_atom(atom);
            }
            group.add_bond(edge);
            group.put(SgroupKey::Subtype, attach.as_deref().unwrap_or("ANY"));
            self.mol.add_sgroup(group);
        }
        Ok(())
    }

    fn sgroup_block(&mut self) -> Result<()> {
        let lines = self.block("SGROUP")?;
        for (line, text) in &lines {
            self.sgroup(*line, text)?;
        }
        log::trace!("read {} sgroups", lines.len());
        Ok(())
    }

    /// `index type external-index [KEY=value ...]`
    fn sgroup(&mut self, line: usize, text: &str) -> Result<()> {
        let tokens = tagged::tokens(text);
        let [index, kind, external, attrs @ ..] = tokens.as_slice() else {
            return Err(MolfileError::parse(line, "sgroup line needs an index, a type and an external index"));
        };
        let number = parse_index(line, index, "sgroup")?;
        let kind = match SgroupType::from_code(kind) {
            Some(kind) => kind,
            None => {
                self.diags
                    .recoverable(line, format!("unknown sgroup type '{kind}'"))?;
                SgroupType::Generic
            }
        };
        let id = self.registry.declare(self.mol.sgroups_mut(), number, kind);
        match external.parse::<u32>() {
            Ok(label) if label > 0 => self.mol.sgroup_mut(id).put(SgroupKey::Identifier, label),
            _ => {}
        }

        for token in attrs {
            let Some((key, value)) = tagged::attribute(token) else {
                self.diags
                    .recoverable(line, format!("malformed attribute '{token}'"))?;
                continue;
            };
            match key.as_str() {
                "ATOMS" | "PATOMS" => {
                    for item in self.list(line, &key, value)? {
                        if let Some(atom) = self.atom_ref(line, item)? {
                            let group = self.mol.sgroup_mut(id);
                            if key == "ATOMS" {
                                group.add_atom(atom);
                            } else {
                                group.add_parent_atom(atom);
                            }
                        }
                    }
                }
                "XBONDS" | "CBONDS" => {
                    for item in self.list(line, &key, value)? {
                        if let Some(bond) = self.bond_ref(line, item)? {
                            self.mol.sgroup_mut(id).add_bond(bond);
                        }
                    }
                }
                "PARENT" => {
                    if let Some(n) = self.int(line, &key, value)? {
                        match u32::try_from(n) {
                            Ok(n) if n > 0 => {
                                let parent = common::ensure_sgroup(
                                    &mut self.registry,
                                    self.mol,
                                    self.diags,
                                    line,
                                    n,
                                );
                                common::link_parent(self.mol, self.diags, line, id, parent)?;
                            }
                            _ => self.diags.recoverable(line, format!("invalid parent {n}"))?,
                        }
                    }
                }
                "COMPNO" => {
                    if let Some(n) = self.int(line, &key, value)? {
                        match u32::try_from(n) {
                            Ok(n) => self.mol.sgroup_mut(id).put(SgroupKey::ComponentNumber, n),
                            Err(_) => self
                                .diags
                                .recoverable(line, format!("invalid component number {n}"))?,
                        }
                    }
                }
                "BRKXYZ" => {
                    let items = self.list(line, &key, value)?;
                    let values: Vec<f64> = items.iter().filter_map(|t| read_coordinate(t)).collect();
                    if items.len() == 9 && values.len() == 9 {
                        self.mol.sgroup_mut(id).add_bracket(SgroupBracket {
                            start: [values[0], values[1]],
                            end: [values[3], values[4]],
                        });
                    } else {
                        self.diags
                            .recoverable(line, format!("BRKXYZ needs 9 numbers, found '{value}'"))?;
                    }
                }
                "BRKTYP" => {
                    let style = match tagged::unquote(value).as_ref() {
                        "PAREN" => BracketStyle::Round,
                        _ => BracketStyle::Square,
                    };
                    self.mol.sgroup_mut(id).put(SgroupKey::BracketStyle, style);
                }
                "ESTATE" => {
                    let expanded = tagged::unquote(value).eq_ignore_ascii_case("E");
                    self.mol.sgroup_mut(id).put(SgroupKey::Expansion, expanded);
                }
                "SAP" => {
                    let items = self.list(line, &key, value)?;
                    let [atom, leaving, label] = items.as_slice() else {
                        self.diags
                            .recoverable(line, format!("SAP needs three values, found '{value}'"))?;
                        continue;
                    };
                    let Some(atom) = self.atom_ref(line, atom)? else {
                        continue;
                    };
                    let leaving = match *leaving {
                        "0" => None,
                        token => self.atom_ref(line, token)?,
                    };
                    self.mol.sgroup_mut(id).add_attach_point(AttachPoint {
                        atom,
                        leaving,
                        id: tagged::unquote(label).into_owned(),
                    });
                }
                _ => {
                    let text_key = match key.as_str() {
                        "SUBTYPE" => Some(SgroupKey::Subtype),
                        "CONNECT" => Some(SgroupKey::Connectivity),
                        "MULT" | "LABEL" => Some(SgroupKey::Subscript),
                        "CLASS" => Some(SgroupKey::Class),
                        "FIELDNAME" => Some(SgroupKey::FieldName),
                        "FIELDINFO" => Some(SgroupKey::FieldUnits),
                        "FIELDDISP" => Some(SgroupKey::DataDisplay),
                        "FIELDDATA" => Some(SgroupKey::Data),
                        _ => None,
                    };
                    match text_key {
                        Some(k) => self.mol.sgroup_mut(id).put(k, tagged::unquote(value).into_owned()),
                        None if IGNORED_SGROUP_KEYS.contains(&key.as_str()) => {
                            log::debug!("line {line}: ignoring sgroup attribute {key}");
                        }
                        None => self.diags.unrecognized(line, &key),
                    }
                }
            }
        }
        Ok(())
    }
}
