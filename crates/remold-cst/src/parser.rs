//! Recursive-descent parser for the C-family subset.
//!
//! The parser consumes the merged token stream produced by the include
//! driver and builds the flat node arena. Node ids are assigned in
//! pre-order by reserving the parent's slot before its children are
//! parsed.
//!
//! Subset notes: no templates, no ternary operator, no constructor
//! initializer lists, no operator overload definitions other than
//! conversion members. Unsupported syntax is a parse error, which the
//! coordinator treats as a per-file skip.

use std::collections::HashMap;

use remold_core::patch::Span;
use thiserror::Error;

use crate::nodes::{Access, BinaryOp, FunctionKind, Node, NodeData, NodeId, UnaryOp};
use crate::tokenizer::{FileId, Punct, TokKind, Token, TokenError};
use crate::types::{Builtin, QualType, Qualifiers, TagKind, Type};

/// Parser failure. The offset is a byte position in the file identified
/// by `file`.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ParseError {
    #[error("tokenizer error: {0}")]
    Token(#[from] TokenError),
    #[error("{message} at byte {offset} of {file}")]
    Unexpected {
        message: String,
        offset: usize,
        file: FileId,
    },
    #[error("unexpected end of input")]
    Eof,
}

/// Parse a merged token stream into a node arena. The returned vector's
/// first element is the translation-unit root; parent links are set.
pub(crate) fn parse_tokens(tokens: &[Token], main_file: FileId) -> Result<Vec<Node>, ParseError> {
    let mut parser = Parser {
        tokens,
        pos: 0,
        nodes: Vec::new(),
        type_names: HashMap::new(),
        main_file,
    };
    parser.translation_unit()?;
    let mut nodes = renumber_preorder(parser.nodes);
    fix_parents(&mut nodes);
    Ok(nodes)
}

/// Expression nodes receive their arena slot after their operands, so
/// creation order is not pre-order. Renumber the arena so ids follow
/// pre-order (parent before children, left to right) and are stable for
/// identical input.
fn renumber_preorder(nodes: Vec<Node>) -> Vec<Node> {
    let mut order = Vec::with_capacity(nodes.len());
    let mut stack = vec![NodeId(0)];
    while let Some(id) = stack.pop() {
        order.push(id);
        let children = nodes[id.index()].data.children();
        for child in children.iter().rev() {
            stack.push(*child);
        }
    }

    let mut forward = vec![NodeId(0); nodes.len()];
    for (new_index, old) in order.iter().enumerate() {
        forward[old.index()] = NodeId(new_index as u32);
    }

    let mut renumbered: Vec<Option<Node>> = (0..nodes.len()).map(|_| None).collect();
    for node in nodes {
        let mut node = node;
        let new_id = forward[node.id.index()];
        node.id = new_id;
        node.data.map_ids(&|old| forward[old.index()]);
        renumbered[new_id.index()] = Some(node);
    }
    renumbered
        .into_iter()
        .map(|node| node.expect("every node is reachable from the root"))
        .collect()
}

fn fix_parents(nodes: &mut [Node]) {
    let mut links = Vec::new();
    for node in nodes.iter() {
        for child in node.data.children() {
            links.push((child, node.id));
        }
    }
    for (child, parent) in links {
        nodes[child.index()].parent = Some(parent);
    }
}

struct Parser<'a> {
    tokens: &'a [Token],
    pos: usize,
    nodes: Vec<Node>,
    /// Record, enum, and typedef names seen so far, with their tag kind
    /// (`None` for typedefs); used to disambiguate declarations from
    /// expressions at statement level and to type bare name uses.
    type_names: HashMap<String, Option<TagKind>>,
    main_file: FileId,
}

impl<'a> Parser<'a> {
    // ------------------------------------------------------------------
    // Token access
    // ------------------------------------------------------------------

    fn peek(&self) -> Option<&Token> {
        self.tokens.get(self.pos)
    }

    fn peek_at(&self, ahead: usize) -> Option<&Token> {
        self.tokens.get(self.pos + ahead)
    }

    fn bump(&mut self) -> Result<&Token, ParseError> {
        let token = self.tokens.get(self.pos).ok_or(ParseError::Eof)?;
        self.pos += 1;
        Ok(token)
    }

    fn at_punct(&self, punct: Punct) -> bool {
        self.peek().is_some_and(|token| token.is_punct(punct))
    }

    fn at_ident(&self, text: &str) -> bool {
        self.peek().is_some_and(|token| token.is_ident(text))
    }

    fn eat_punct(&mut self, punct: Punct) -> bool {
        if self.at_punct(punct) {
            self.pos += 1;
            true
        } else {
            false
        }
    }

    fn eat_ident(&mut self, text: &str) -> bool {
        if self.at_ident(text) {
            self.pos += 1;
            true
        } else {
            false
        }
    }

    fn expect_punct(&mut self, punct: Punct, context: &'static str) -> Result<(), ParseError> {
        if self.eat_punct(punct) {
            Ok(())
        } else {
            Err(self.unexpected(format!("expected {punct:?} in {context}")))
        }
    }

    fn expect_name(&mut self, context: &'static str) -> Result<String, ParseError> {
        match self.peek() {
            Some(Token {
                kind: TokKind::Ident(name),
                ..
            }) if !is_keyword(name) => {
                let name = name.clone();
                self.pos += 1;
                Ok(name)
            }
            _ => Err(self.unexpected(format!("expected identifier in {context}"))),
        }
    }

    fn unexpected(&self, message: String) -> ParseError {
        match self.peek() {
            Some(token) => ParseError::Unexpected {
                message,
                offset: token.span.start,
                file: token.file,
            },
            None => ParseError::Eof,
        }
    }

    fn start(&self) -> Result<(usize, FileId), ParseError> {
        let token = self.peek().ok_or(ParseError::Eof)?;
        Ok((token.span.start, token.file))
    }

    fn end_span(&self, start: usize) -> Span {
        let end = self
            .tokens
            .get(self.pos.saturating_sub(1))
            .map(|token| token.span.end)
            .unwrap_or(start);
        Span::new(start, end.max(start))
    }

    // ------------------------------------------------------------------
    // Arena helpers
    // ------------------------------------------------------------------

    fn reserve(&mut self, file: FileId) -> NodeId {
        let id = NodeId(self.nodes.len() as u32);
        self.nodes.push(Node {
            id,
            parent: None,
            file,
            span: Span::new(0, 0),
            data: NodeData::Null,
        });
        id
    }

    fn fill(&mut self, id: NodeId, span: Span, data: NodeData) {
        let node = &mut self.nodes[id.index()];
        node.span = span;
        node.data = data;
    }

    // ------------------------------------------------------------------
    // Declarations
    // ------------------------------------------------------------------

    fn translation_unit(&mut self) -> Result<NodeId, ParseError> {
        let file = self.peek().map(|token| token.file).unwrap_or(self.main_file);
        let root = self.reserve(file);
        let mut decls = Vec::new();
        while self.peek().is_some() {
            decls.extend(self.declaration(Access::Default)?);
        }
        let end = self
            .tokens
            .last()
            .map(|token| token.span.end)
            .unwrap_or_default();
        self.fill(
            root,
            Span::new(0, end),
            NodeData::TranslationUnit { decls },
        );
        Ok(root)
    }

    /// Parse one declaration; a comma declarator list yields several.
    fn declaration(&mut self, access: Access) -> Result<Vec<NodeId>, ParseError> {
        if self.at_ident("namespace") {
            return Ok(vec![self.namespace()?]);
        }
        if self.at_ident("using") {
            return Ok(vec![self.using_directive()?]);
        }
        if self.at_ident("typedef") {
            return Ok(vec![self.typedef()?]);
        }
        if self.at_ident("enum") {
            return Ok(vec![self.enum_decl(access)?]);
        }
        if self.at_record_keyword() && !self.record_is_type_prefix() {
            return Ok(vec![self.record_decl(access)?]);
        }
        self.value_declaration(access)
    }

    fn at_record_keyword(&self) -> bool {
        self.at_ident("class") || self.at_ident("struct") || self.at_ident("union")
    }

    /// `struct Foo x;` uses the keyword as a type prefix; a definition or
    /// forward declaration is followed by `{` or `;` after the name.
    fn record_is_type_prefix(&self) -> bool {
        matches!(
            (self.peek_at(1), self.peek_at(2)),
            (Some(Token { kind: TokKind::Ident(_), .. }), Some(next))
                if !next.is_punct(Punct::LBrace) && !next.is_punct(Punct::Semi)
        )
    }

    fn namespace(&mut self) -> Result<NodeId, ParseError> {
        let (start, file) = self.start()?;
        let id = self.reserve(file);
        self.bump()?; // namespace
        let name = self.expect_name("namespace declaration")?;
        self.expect_punct(Punct::LBrace, "namespace body")?;
        let mut decls = Vec::new();
        while !self.at_punct(Punct::RBrace) {
            decls.extend(self.declaration(Access::Default)?);
        }
        self.expect_punct(Punct::RBrace, "namespace body")?;
        self.fill(id, self.end_span(start), NodeData::Namespace { name, decls });
        Ok(id)
    }

    fn using_directive(&mut self) -> Result<NodeId, ParseError> {
        let (start, file) = self.start()?;
        let id = self.reserve(file);
        self.bump()?; // using
        if !self.eat_ident("namespace") {
            return Err(self.unexpected("expected 'namespace' after 'using'".into()));
        }
        let namespace = self.qualified_name("using directive")?;
        self.expect_punct(Punct::Semi, "using directive")?;
        self.fill(
            id,
            self.end_span(start),
            NodeData::UsingDirective { namespace },
        );
        Ok(id)
    }

    fn typedef(&mut self) -> Result<NodeId, ParseError> {
        let (start, file) = self.start()?;
        let id = self.reserve(file);
        self.bump()?; // typedef
        let base = self.type_specifier()?;
        let (ty, name) = self.declarator(base, "typedef")?;
        self.expect_punct(Punct::Semi, "typedef")?;
        self.type_names.insert(name.clone(), None);
        self.fill(id, self.end_span(start), NodeData::Typedef { name, ty });
        Ok(id)
    }

    fn enum_decl(&mut self, access: Access) -> Result<NodeId, ParseError> {
        let (start, file) = self.start()?;
        let id = self.reserve(file);
        self.bump()?; // enum
        let name = self.expect_name("enum declaration")?;
        self.type_names.insert(name.clone(), Some(TagKind::Enum));
        self.expect_punct(Punct::LBrace, "enum body")?;
        let mut enumerators = Vec::new();
        while !self.at_punct(Punct::RBrace) {
            let (e_start, e_file) = self.start()?;
            let e_id = self.reserve(e_file);
            let e_name = self.expect_name("enumerator")?;
            let init = if self.eat_punct(Punct::Eq) {
                Some(self.expression()?)
            } else {
                None
            };
            self.fill(
                e_id,
                self.end_span(e_start),
                NodeData::EnumConstant { name: e_name, init },
            );
            enumerators.push(e_id);
            if !self.eat_punct(Punct::Comma) {
                break;
            }
        }
        self.expect_punct(Punct::RBrace, "enum body")?;
        self.expect_punct(Punct::Semi, "enum declaration")?;
        self.fill(
            id,
            self.end_span(start),
            NodeData::Enum {
                name,
                enumerators,
                access,
            },
        );
        Ok(id)
    }

    fn record_decl(&mut self, access: Access) -> Result<NodeId, ParseError> {
        let (start, file) = self.start()?;
        let id = self.reserve(file);
        let keyword = self.bump()?.clone();
        let tag = match &keyword.kind {
            TokKind::Ident(name) if name == "class" => TagKind::Class,
            TokKind::Ident(name) if name == "struct" => TagKind::Struct,
            _ => TagKind::Union,
        };
        let name = self.expect_name("record declaration")?;
        let name_span = self.tokens[self.pos - 1].span;
        self.type_names.insert(name.clone(), Some(tag));

        let mut members = Vec::new();
        if self.eat_punct(Punct::LBrace) {
            // Default member access depends on the tag kind.
            let default_access = if tag == TagKind::Class {
                Access::Private
            } else {
                Access::Public
            };
            // A definition refers to itself through its injected class
            // name, declared first among the members.
            let injected = self.reserve(file);
            self.fill(
                injected,
                name_span,
                NodeData::Record {
                    name: name.clone(),
                    tag,
                    members: Vec::new(),
                    access: default_access,
                    injected: true,
                },
            );
            members.push(injected);

            let mut current = default_access;
            while !self.at_punct(Punct::RBrace) {
                if let Some(specifier) = self.access_specifier() {
                    current = specifier;
                    continue;
                }
                members.extend(self.member_declaration(current, &name)?);
            }
            self.expect_punct(Punct::RBrace, "record body")?;
        }
        self.expect_punct(Punct::Semi, "record declaration")?;
        self.fill(
            id,
            self.end_span(start),
            NodeData::Record {
                name,
                tag,
                members,
                access,
                injected: false,
            },
        );
        Ok(id)
    }

    fn access_specifier(&mut self) -> Option<Access> {
        let access = match self.peek() {
            Some(token) if token.is_ident("public") => Access::Public,
            Some(token) if token.is_ident("protected") => Access::Protected,
            Some(token) if token.is_ident("private") => Access::Private,
            _ => return None,
        };
        if self.peek_at(1).is_some_and(|t| t.is_punct(Punct::Colon)) {
            self.pos += 2;
            Some(access)
        } else {
            None
        }
    }

    fn member_declaration(
        &mut self,
        access: Access,
        record_name: &str,
    ) -> Result<Vec<NodeId>, ParseError> {
        // Destructor: ~Name ( ) body-or-;
        if self.at_punct(Punct::Tilde) {
            return Ok(vec![self.special_member(
                access,
                record_name,
                FunctionKind::Destructor,
            )?]);
        }
        // Conversion member: operator <type> ( ) body-or-;
        if self.at_ident("operator") {
            return Ok(vec![self.conversion_member(access, record_name)?]);
        }
        // Constructor: the record's own name followed by '('.
        if self.at_ident(record_name)
            && self.peek_at(1).is_some_and(|t| t.is_punct(Punct::LParen))
        {
            return Ok(vec![self.special_member(
                access,
                record_name,
                FunctionKind::Constructor,
            )?]);
        }
        self.value_declaration(access)
    }

    fn special_member(
        &mut self,
        access: Access,
        record_name: &str,
        fn_kind: FunctionKind,
    ) -> Result<NodeId, ParseError> {
        let (start, file) = self.start()?;
        let id = self.reserve(file);
        let name = if fn_kind == FunctionKind::Destructor {
            self.bump()?; // '~'
            let name = self.expect_name("destructor")?;
            if name != record_name {
                return Err(self.unexpected(format!("destructor name ~{name} does not match class")));
            }
            format!("~{name}")
        } else {
            self.expect_name("constructor")?
        };
        let ret = QualType::unqualified(Type::Builtin(Builtin::Void));
        let (params, body) = self.function_rest()?;
        self.fill(
            id,
            self.end_span(start),
            NodeData::Function {
                name,
                fn_kind,
                ty: QualType::unqualified(Type::Function { ret: Box::new(ret) }),
                params,
                body,
                access,
                is_virtual: false,
                is_const: false,
                is_static: false,
            },
        );
        Ok(id)
    }

    fn conversion_member(
        &mut self,
        access: Access,
        _record_name: &str,
    ) -> Result<NodeId, ParseError> {
        let (start, file) = self.start()?;
        let id = self.reserve(file);
        self.bump()?; // operator
        let target = self.type_specifier()?;
        let target = self.pointer_suffix(target);
        let name = format!("operator {}", describe_type(&target));
        let (params, body) = self.function_rest()?;
        self.fill(
            id,
            self.end_span(start),
            NodeData::Function {
                name,
                fn_kind: FunctionKind::Conversion,
                ty: QualType::unqualified(Type::Function {
                    ret: Box::new(target),
                }),
                params,
                body,
                access,
                is_virtual: false,
                is_const: false,
                is_static: false,
            },
        );
        Ok(id)
    }

    /// A variable, field, or function declaration (comma declarators
    /// allowed for data). The `virtual`/`static` prefixes and a trailing
    /// `const` qualifier are picked up for method-like declarations.
    fn value_declaration(&mut self, access: Access) -> Result<Vec<NodeId>, ParseError> {
        let (start, file) = self.start()?;
        let mut is_virtual = false;
        let mut is_static = false;
        loop {
            if self.eat_ident("virtual") {
                is_virtual = true;
            } else if self.eat_ident("static") {
                is_static = true;
            } else if self.eat_ident("inline") {
                // accepted and not modeled
            } else {
                break;
            }
        }

        let base = self.type_specifier()?;
        let mut out = Vec::new();
        loop {
            let decl_start = if out.is_empty() {
                start
            } else {
                self.start()?.0
            };
            let id = self.reserve(file);
            let (ty, name) = self.declarator(base.clone(), "declaration")?;

            if self.at_punct(Punct::LParen) {
                // Function declarator.
                let (params, is_const, body) = self.function_parts()?;
                let fn_kind = if access == Access::Default {
                    FunctionKind::Free
                } else {
                    FunctionKind::Method
                };
                self.fill(
                    id,
                    self.end_span(decl_start),
                    NodeData::Function {
                        name,
                        fn_kind,
                        ty: QualType::unqualified(Type::Function { ret: Box::new(ty) }),
                        params,
                        body,
                        access,
                        is_virtual,
                        is_const,
                        is_static,
                    },
                );
                out.push(id);
                return Ok(out);
            }

            let ty = self.array_suffix(ty)?;
            let init = if self.eat_punct(Punct::Eq) {
                Some(self.assignment()?)
            } else {
                None
            };
            let data = if access == Access::Default {
                NodeData::Var {
                    name,
                    ty,
                    init,
                    access,
                }
            } else if is_static {
                // Static data members behave like variables.
                NodeData::Var {
                    name,
                    ty,
                    init,
                    access,
                }
            } else {
                NodeData::Field {
                    name,
                    ty,
                    init,
                    access,
                }
            };
            self.fill(id, self.end_span(decl_start), data);
            out.push(id);
            if !self.eat_punct(Punct::Comma) {
                break;
            }
        }
        self.expect_punct(Punct::Semi, "declaration")?;
        Ok(out)
    }

    fn function_rest(&mut self) -> Result<(Vec<NodeId>, Option<NodeId>), ParseError> {
        let (params, _, body) = self.function_parts()?;
        Ok((params, body))
    }

    /// Parameter list, trailing `const`, and optional body.
    fn function_parts(&mut self) -> Result<(Vec<NodeId>, bool, Option<NodeId>), ParseError> {
        self.expect_punct(Punct::LParen, "parameter list")?;
        let mut params = Vec::new();
        while !self.at_punct(Punct::RParen) {
            let (p_start, p_file) = self.start()?;
            let p_id = self.reserve(p_file);
            let base = self.type_specifier()?;
            let (ty, name) = self.opt_declarator(base)?;
            let default = if self.eat_punct(Punct::Eq) {
                Some(self.assignment()?)
            } else {
                None
            };
            self.fill(
                p_id,
                self.end_span(p_start),
                NodeData::Param { name, ty, default },
            );
            params.push(p_id);
            if !self.eat_punct(Punct::Comma) {
                break;
            }
        }
        self.expect_punct(Punct::RParen, "parameter list")?;
        let is_const = self.eat_ident("const");
        let body = if self.at_punct(Punct::LBrace) {
            Some(self.compound_statement()?)
        } else {
            self.expect_punct(Punct::Semi, "function declaration")?;
            None
        };
        Ok((params, is_const, body))
    }

    // ------------------------------------------------------------------
    // Types and declarators
    // ------------------------------------------------------------------

    fn type_specifier(&mut self) -> Result<QualType, ParseError> {
        let mut quals = Qualifiers::none();
        loop {
            if self.eat_ident("const") {
                quals.is_const = true;
            } else if self.eat_ident("volatile") {
                quals.is_volatile = true;
            } else {
                break;
            }
        }

        let ty = if self.at_ident("class") || self.at_ident("struct") || self.at_ident("union") {
            let keyword = self.bump()?.clone();
            let kind = match &keyword.kind {
                TokKind::Ident(name) if name == "class" => TagKind::Class,
                TokKind::Ident(name) if name == "struct" => TagKind::Struct,
                _ => TagKind::Union,
            };
            let name = self.expect_name("tag type")?;
            Type::Tag { kind, name }
        } else if self.at_ident("enum") {
            self.bump()?;
            let name = self.expect_name("enum type")?;
            Type::Tag {
                kind: TagKind::Enum,
                name,
            }
        } else if let Some(builtin) = self.builtin_type()? {
            Type::Builtin(builtin)
        } else {
            // Record, enum, and typedef names used without a tag keyword.
            let name = self.qualified_name("type name")?;
            match self.type_names.get(&name) {
                Some(Some(kind)) => Type::Tag { kind: *kind, name },
                _ => Type::Named(name),
            }
        };

        // Qualifiers may also trail the specifier (`int const`).
        loop {
            if self.eat_ident("const") {
                quals.is_const = true;
            } else if self.eat_ident("volatile") {
                quals.is_volatile = true;
            } else {
                break;
            }
        }
        Ok(QualType { quals, ty })
    }

    fn builtin_type(&mut self) -> Result<Option<Builtin>, ParseError> {
        let mut unsigned = false;
        let mut signed = false;
        if self.at_ident("unsigned") {
            unsigned = true;
            self.pos += 1;
        } else if self.at_ident("signed") {
            signed = true;
            self.pos += 1;
        }
        let builtin = match self.peek() {
            Some(token) if token.is_ident("void") => Some(Builtin::Void),
            Some(token) if token.is_ident("bool") => Some(Builtin::Bool),
            Some(token) if token.is_ident("char") => Some(if unsigned {
                Builtin::UChar
            } else {
                Builtin::Char
            }),
            Some(token) if token.is_ident("short") => Some(if unsigned {
                Builtin::UShort
            } else {
                Builtin::Short
            }),
            Some(token) if token.is_ident("int") => Some(if unsigned {
                Builtin::UInt
            } else {
                Builtin::Int
            }),
            Some(token) if token.is_ident("long") => Some(if unsigned {
                Builtin::ULong
            } else {
                Builtin::Long
            }),
            Some(token) if token.is_ident("float") => Some(Builtin::Float),
            Some(token) if token.is_ident("double") => Some(Builtin::Double),
            _ => None,
        };
        match builtin {
            Some(builtin) => {
                self.pos += 1;
                // `long long` and `long int` collapse to the first keyword.
                while self.at_ident("long") || self.at_ident("int") {
                    self.pos += 1;
                }
                Ok(Some(builtin))
            }
            None if unsigned => Ok(Some(Builtin::UInt)),
            None if signed => Ok(Some(Builtin::Int)),
            None => Ok(None),
        }
    }

    fn pointer_suffix(&mut self, mut ty: QualType) -> QualType {
        loop {
            if self.eat_punct(Punct::Star) {
                let mut quals = Qualifiers::none();
                while self.eat_ident("const") {
                    quals.is_const = true;
                }
                ty = QualType {
                    quals,
                    ty: Type::Pointer(Box::new(ty)),
                };
            } else if self.eat_punct(Punct::Amp) {
                ty = QualType::unqualified(Type::LValueRef(Box::new(ty)));
            } else if self.eat_punct(Punct::AmpAmp) {
                ty = QualType::unqualified(Type::RValueRef(Box::new(ty)));
            } else {
                return ty;
            }
        }
    }

    fn array_suffix(&mut self, mut ty: QualType) -> Result<QualType, ParseError> {
        while self.eat_punct(Punct::LBracket) {
            let size = match self.peek() {
                Some(Token {
                    kind: TokKind::Int(value),
                    ..
                }) => {
                    let value = *value as u64;
                    self.pos += 1;
                    Some(value)
                }
                _ => None,
            };
            self.expect_punct(Punct::RBracket, "array declarator")?;
            ty = QualType::unqualified(Type::Array {
                elem: Box::new(ty),
                size,
            });
        }
        Ok(ty)
    }

    fn declarator(
        &mut self,
        base: QualType,
        context: &'static str,
    ) -> Result<(QualType, String), ParseError> {
        let ty = self.pointer_suffix(base);
        let name = self.qualified_name(context)?;
        Ok((ty, name))
    }

    /// Declarator with an optional name (unnamed parameters).
    fn opt_declarator(&mut self, base: QualType) -> Result<(QualType, String), ParseError> {
        let ty = self.pointer_suffix(base);
        let name = match self.peek() {
            Some(Token {
                kind: TokKind::Ident(name),
                ..
            }) if !is_keyword(name) => {
                let name = name.clone();
                self.pos += 1;
                name
            }
            _ => String::new(),
        };
        let ty = self.array_suffix(ty)?;
        Ok((ty, name))
    }

    fn qualified_name(&mut self, context: &'static str) -> Result<String, ParseError> {
        let mut name = self.expect_name(context)?;
        while self.at_punct(Punct::ColonColon) {
            self.pos += 1;
            name.push_str("::");
            name.push_str(&self.expect_name(context)?);
        }
        Ok(name)
    }

    // ------------------------------------------------------------------
    // Statements
    // ------------------------------------------------------------------

    fn compound_statement(&mut self) -> Result<NodeId, ParseError> {
        let (start, file) = self.start()?;
        let id = self.reserve(file);
        self.expect_punct(Punct::LBrace, "compound statement")?;
        let mut stmts = Vec::new();
        while !self.at_punct(Punct::RBrace) {
            stmts.push(self.statement()?);
        }
        self.expect_punct(Punct::RBrace, "compound statement")?;
        self.fill(id, self.end_span(start), NodeData::Compound { stmts });
        Ok(id)
    }

    fn statement(&mut self) -> Result<NodeId, ParseError> {
        if self.at_punct(Punct::LBrace) {
            return self.compound_statement();
        }
        if self.at_ident("if") {
            return self.if_statement();
        }
        if self.at_ident("while") {
            return self.while_statement();
        }
        if self.at_ident("for") {
            return self.for_statement();
        }
        if self.at_ident("return") {
            let (start, file) = self.start()?;
            let id = self.reserve(file);
            self.bump()?;
            let value = if self.at_punct(Punct::Semi) {
                None
            } else {
                Some(self.expression()?)
            };
            self.expect_punct(Punct::Semi, "return statement")?;
            self.fill(id, self.end_span(start), NodeData::Return { value });
            return Ok(id);
        }
        if self.at_ident("break") {
            let (start, file) = self.start()?;
            let id = self.reserve(file);
            self.bump()?;
            self.expect_punct(Punct::Semi, "break statement")?;
            self.fill(id, self.end_span(start), NodeData::Break);
            return Ok(id);
        }
        if self.at_ident("continue") {
            let (start, file) = self.start()?;
            let id = self.reserve(file);
            self.bump()?;
            self.expect_punct(Punct::Semi, "continue statement")?;
            self.fill(id, self.end_span(start), NodeData::Continue);
            return Ok(id);
        }
        if self.at_punct(Punct::Semi) {
            let (start, file) = self.start()?;
            let id = self.reserve(file);
            self.bump()?;
            self.fill(id, self.end_span(start), NodeData::Null);
            return Ok(id);
        }
        if self.starts_declaration() {
            return self.decl_statement();
        }
        let expr = self.expression()?;
        self.expect_punct(Punct::Semi, "expression statement")?;
        Ok(expr)
    }

    /// Statement-level declaration/expression disambiguation. A leading
    /// type keyword always means a declaration; a leading identifier only
    /// when it is a known type name or is followed by another identifier.
    fn starts_declaration(&self) -> bool {
        let Some(token) = self.peek() else {
            return false;
        };
        let TokKind::Ident(name) = &token.kind else {
            return false;
        };
        if is_type_keyword(name) {
            return true;
        }
        if is_keyword(name) {
            return false;
        }
        if self.type_names.contains_key(name) {
            return true;
        }
        matches!(
            self.peek_at(1),
            Some(Token {
                kind: TokKind::Ident(next),
                ..
            }) if !is_keyword(next)
        )
    }

    fn decl_statement(&mut self) -> Result<NodeId, ParseError> {
        let (start, file) = self.start()?;
        let id = self.reserve(file);
        let decls = self.value_declaration(Access::Default)?;
        self.fill(id, self.end_span(start), NodeData::DeclStmt { decls });
        Ok(id)
    }

    fn if_statement(&mut self) -> Result<NodeId, ParseError> {
        let (start, file) = self.start()?;
        let id = self.reserve(file);
        self.bump()?; // if
        self.expect_punct(Punct::LParen, "if condition")?;
        let cond = self.expression()?;
        self.expect_punct(Punct::RParen, "if condition")?;
        let then_branch = self.statement()?;
        let else_branch = if self.eat_ident("else") {
            Some(self.statement()?)
        } else {
            None
        };
        self.fill(
            id,
            self.end_span(start),
            NodeData::If {
                cond,
                then_branch,
                else_branch,
            },
        );
        Ok(id)
    }

    fn while_statement(&mut self) -> Result<NodeId, ParseError> {
        let (start, file) = self.start()?;
        let id = self.reserve(file);
        self.bump()?; // while
        self.expect_punct(Punct::LParen, "while condition")?;
        let cond = self.expression()?;
        self.expect_punct(Punct::RParen, "while condition")?;
        let body = self.statement()?;
        self.fill(id, self.end_span(start), NodeData::While { cond, body });
        Ok(id)
    }

    fn for_statement(&mut self) -> Result<NodeId, ParseError> {
        let (start, file) = self.start()?;
        let id = self.reserve(file);
        self.bump()?; // for
        self.expect_punct(Punct::LParen, "for header")?;
        let init = if self.at_punct(Punct::Semi) {
            self.bump()?;
            None
        } else if self.starts_declaration() {
            Some(self.decl_statement()?)
        } else {
            let expr = self.expression()?;
            self.expect_punct(Punct::Semi, "for header")?;
            Some(expr)
        };
        let cond = if self.at_punct(Punct::Semi) {
            None
        } else {
            Some(self.expression()?)
        };
        self.expect_punct(Punct::Semi, "for header")?;
        let step = if self.at_punct(Punct::RParen) {
            None
        } else {
            Some(self.expression()?)
        };
        self.expect_punct(Punct::RParen, "for header")?;
        let body = self.statement()?;
        self.fill(
            id,
            self.end_span(start),
            NodeData::For {
                init,
                cond,
                step,
                body,
            },
        );
        Ok(id)
    }

    // ------------------------------------------------------------------
    // Expressions
    // ------------------------------------------------------------------

    fn expression(&mut self) -> Result<NodeId, ParseError> {
        self.assignment()
    }

    fn assignment(&mut self) -> Result<NodeId, ParseError> {
        let (start, file) = self.start()?;
        let lhs = self.binary(0)?;
        let op = match self.peek().map(|token| &token.kind) {
            Some(TokKind::Punct(Punct::Eq)) => Some(BinaryOp::Assign),
            Some(TokKind::Punct(Punct::PlusEq)) => Some(BinaryOp::AddAssign),
            Some(TokKind::Punct(Punct::MinusEq)) => Some(BinaryOp::SubAssign),
            Some(TokKind::Punct(Punct::StarEq)) => Some(BinaryOp::MulAssign),
            Some(TokKind::Punct(Punct::SlashEq)) => Some(BinaryOp::DivAssign),
            Some(TokKind::Punct(Punct::PercentEq)) => Some(BinaryOp::RemAssign),
            Some(TokKind::Punct(Punct::ShlEq)) => Some(BinaryOp::ShlAssign),
            Some(TokKind::Punct(Punct::ShrEq)) => Some(BinaryOp::ShrAssign),
            Some(TokKind::Punct(Punct::AmpEq)) => Some(BinaryOp::AndAssign),
            Some(TokKind::Punct(Punct::PipeEq)) => Some(BinaryOp::OrAssign),
            Some(TokKind::Punct(Punct::CaretEq)) => Some(BinaryOp::XorAssign),
            _ => None,
        };
        let Some(op) = op else {
            return Ok(lhs);
        };
        self.pos += 1;
        let rhs = self.assignment()?;
        let id = self.reserve(file);
        self.fill(id, self.end_span(start), NodeData::Binary { op, lhs, rhs });
        Ok(id)
    }

    fn binary(&mut self, min_level: usize) -> Result<NodeId, ParseError> {
        const LEVELS: &[&[(Punct, BinaryOp)]] = &[
            &[(Punct::PipePipe, BinaryOp::LogicalOr)],
            &[(Punct::AmpAmp, BinaryOp::LogicalAnd)],
            &[(Punct::Pipe, BinaryOp::BitOr)],
            &[(Punct::Caret, BinaryOp::BitXor)],
            &[(Punct::Amp, BinaryOp::BitAnd)],
            &[(Punct::EqEq, BinaryOp::Eq), (Punct::BangEq, BinaryOp::Ne)],
            &[
                (Punct::Lt, BinaryOp::Lt),
                (Punct::Gt, BinaryOp::Gt),
                (Punct::Le, BinaryOp::Le),
                (Punct::Ge, BinaryOp::Ge),
            ],
            &[(Punct::Shl, BinaryOp::Shl), (Punct::Shr, BinaryOp::Shr)],
            &[(Punct::Plus, BinaryOp::Add), (Punct::Minus, BinaryOp::Sub)],
            &[
                (Punct::Star, BinaryOp::Mul),
                (Punct::Slash, BinaryOp::Div),
                (Punct::Percent, BinaryOp::Rem),
            ],
        ];

        if min_level >= LEVELS.len() {
            return self.unary();
        }
        let (start, file) = self.start()?;
        let mut lhs = self.binary(min_level + 1)?;
        'outer: loop {
            for (punct, op) in LEVELS[min_level] {
                if self.at_punct(*punct) {
                    self.pos += 1;
                    let rhs = self.binary(min_level + 1)?;
                    let id = self.reserve(file);
                    self.fill(
                        id,
                        self.end_span(start),
                        NodeData::Binary { op: *op, lhs, rhs },
                    );
                    lhs = id;
                    continue 'outer;
                }
            }
            return Ok(lhs);
        }
    }

    fn unary(&mut self) -> Result<NodeId, ParseError> {
        let (start, file) = self.start()?;
        let op = match self.peek().map(|token| &token.kind) {
            Some(TokKind::Punct(Punct::Plus)) => Some(UnaryOp::Plus),
            Some(TokKind::Punct(Punct::Minus)) => Some(UnaryOp::Minus),
            Some(TokKind::Punct(Punct::Bang)) => Some(UnaryOp::Not),
            Some(TokKind::Punct(Punct::Tilde)) => Some(UnaryOp::BitNot),
            Some(TokKind::Punct(Punct::PlusPlus)) => Some(UnaryOp::PreInc),
            Some(TokKind::Punct(Punct::MinusMinus)) => Some(UnaryOp::PreDec),
            Some(TokKind::Punct(Punct::Star)) => Some(UnaryOp::Deref),
            Some(TokKind::Punct(Punct::Amp)) => Some(UnaryOp::AddrOf),
            _ => None,
        };
        if let Some(op) = op {
            self.pos += 1;
            let operand = self.unary()?;
            let id = self.reserve(file);
            self.fill(id, self.end_span(start), NodeData::Unary { op, operand });
            return Ok(id);
        }
        self.postfix()
    }

    fn postfix(&mut self) -> Result<NodeId, ParseError> {
        let (start, file) = self.start()?;
        let mut expr = self.primary()?;
        loop {
            if self.eat_punct(Punct::LParen) {
                let mut args = Vec::new();
                while !self.at_punct(Punct::RParen) {
                    args.push(self.assignment()?);
                    if !self.eat_punct(Punct::Comma) {
                        break;
                    }
                }
                self.expect_punct(Punct::RParen, "call arguments")?;
                let id = self.reserve(file);
                self.fill(
                    id,
                    self.end_span(start),
                    NodeData::Call { callee: expr, args },
                );
                expr = id;
            } else if self.at_punct(Punct::Dot) || self.at_punct(Punct::Arrow) {
                let arrow = self.at_punct(Punct::Arrow);
                self.pos += 1;
                let name = self.expect_name("member access")?;
                let id = self.reserve(file);
                self.fill(
                    id,
                    self.end_span(start),
                    NodeData::Member {
                        base: expr,
                        name,
                        arrow,
                        target: None,
                    },
                );
                expr = id;
            } else if self.at_punct(Punct::PlusPlus) || self.at_punct(Punct::MinusMinus) {
                let op = if self.at_punct(Punct::PlusPlus) {
                    UnaryOp::PostInc
                } else {
                    UnaryOp::PostDec
                };
                self.pos += 1;
                let id = self.reserve(file);
                self.fill(
                    id,
                    self.end_span(start),
                    NodeData::Unary { op, operand: expr },
                );
                expr = id;
            } else {
                return Ok(expr);
            }
        }
    }

    fn primary(&mut self) -> Result<NodeId, ParseError> {
        let (start, file) = self.start()?;
        let token = self.peek().ok_or(ParseError::Eof)?.clone();
        match token.kind {
            TokKind::Int(value) => {
                self.pos += 1;
                let id = self.reserve(file);
                self.fill(id, self.end_span(start), NodeData::IntLit { value });
                Ok(id)
            }
            TokKind::Float { bits, exact } => {
                self.pos += 1;
                let id = self.reserve(file);
                self.fill(id, self.end_span(start), NodeData::FloatLit { bits, exact });
                Ok(id)
            }
            TokKind::Char { wide, value } => {
                self.pos += 1;
                let id = self.reserve(file);
                self.fill(id, self.end_span(start), NodeData::CharLit { wide, value });
                Ok(id)
            }
            TokKind::Str { wide, value } => {
                self.pos += 1;
                let id = self.reserve(file);
                self.fill(id, self.end_span(start), NodeData::StrLit { wide, value });
                Ok(id)
            }
            TokKind::Ident(name) if name == "true" || name == "false" => {
                self.pos += 1;
                let id = self.reserve(file);
                self.fill(
                    id,
                    self.end_span(start),
                    NodeData::BoolLit {
                        value: name == "true",
                    },
                );
                Ok(id)
            }
            TokKind::Ident(ref name) if !is_keyword(name) => {
                let name = self.qualified_name("expression")?;
                let id = self.reserve(file);
                self.fill(
                    id,
                    self.end_span(start),
                    NodeData::DeclRef { name, target: None },
                );
                Ok(id)
            }
            TokKind::Punct(Punct::LParen) => {
                self.pos += 1;
                let inner = self.expression()?;
                self.expect_punct(Punct::RParen, "parenthesized expression")?;
                let id = self.reserve(file);
                self.fill(id, self.end_span(start), NodeData::Paren { inner });
                Ok(id)
            }
            _ => Err(self.unexpected("expected expression".into())),
        }
    }
}

fn is_type_keyword(name: &str) -> bool {
    matches!(
        name,
        "void"
            | "bool"
            | "char"
            | "short"
            | "int"
            | "long"
            | "unsigned"
            | "signed"
            | "float"
            | "double"
            | "const"
            | "volatile"
            | "static"
            | "virtual"
            | "inline"
            | "class"
            | "struct"
            | "union"
            | "enum"
    )
}

fn is_keyword(name: &str) -> bool {
    is_type_keyword(name)
        || matches!(
            name,
            "if" | "else"
                | "while"
                | "for"
                | "return"
                | "break"
                | "continue"
                | "namespace"
                | "using"
                | "typedef"
                | "operator"
                | "public"
                | "protected"
                | "private"
                | "true"
                | "false"
        )
}

fn describe_type(ty: &QualType) -> String {
    fn type_text(ty: &Type) -> String {
        match ty {
            Type::Builtin(builtin) => format!("{builtin:?}").to_lowercase(),
            Type::Pointer(inner) => format!("{}*", type_text(&inner.ty)),
            Type::LValueRef(inner) => format!("{}&", type_text(&inner.ty)),
            Type::RValueRef(inner) => format!("{}&&", type_text(&inner.ty)),
            Type::Array { elem, .. } => format!("{}[]", type_text(&elem.ty)),
            Type::Function { ret } => format!("{}()", type_text(&ret.ty)),
            Type::Tag { name, .. } | Type::Named(name) => name.clone(),
        }
    }
    type_text(&ty.ty)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::nodes::NodeKind;
    use crate::unit::Unit;

    fn parse(text: &str) -> Unit {
        Unit::parse_str(text, "parse.cc").expect("parse error")
    }

    fn top(unit: &Unit, index: usize) -> NodeId {
        unit.children(unit.root())[index]
    }

    mod declarations {
        use super::*;

        #[test]
        fn function_with_parameters_and_body() {
            let unit = parse("int add(int a, int b) { return a + b; }");
            let NodeData::Function {
                name,
                fn_kind,
                params,
                body,
                ..
            } = &unit.node(top(&unit, 0)).data
            else {
                panic!("expected a function");
            };
            assert_eq!(name, "add");
            assert_eq!(*fn_kind, FunctionKind::Free);
            assert_eq!(params.len(), 2);
            assert!(body.is_some());
        }

        #[test]
        fn forward_declaration_has_no_body() {
            let unit = parse("void forward(int);");
            let NodeData::Function { body, params, .. } = &unit.node(top(&unit, 0)).data else {
                panic!("expected a function");
            };
            assert!(body.is_none());
            assert_eq!(params.len(), 1);
            // Unnamed parameter.
            assert_eq!(unit.name_of(params[0]), Some(""));
        }

        #[test]
        fn record_members_track_access_and_kind() {
            let unit = parse(
                "class Box { public: Box(); ~Box(); operator int(); virtual int get() const; private: int v; };",
            );
            let record = top(&unit, 0);
            let members = unit.children(record);
            // The injected class name leads the member list.
            assert_eq!(members.len(), 6);
            assert!(unit.node(members[0]).data.is_injected_class_name());

            let kinds: Vec<FunctionKind> = members[1..5]
                .iter()
                .filter_map(|member| match &unit.node(*member).data {
                    NodeData::Function { fn_kind, .. } => Some(*fn_kind),
                    _ => None,
                })
                .collect();
            assert_eq!(
                kinds,
                vec![
                    FunctionKind::Constructor,
                    FunctionKind::Destructor,
                    FunctionKind::Conversion,
                    FunctionKind::Method,
                ]
            );

            let NodeData::Function {
                is_virtual,
                is_const,
                access,
                ..
            } = &unit.node(members[4]).data
            else {
                panic!("expected the method");
            };
            assert!(*is_virtual);
            assert!(*is_const);
            assert_eq!(*access, Access::Public);

            let NodeData::Field { access, .. } = &unit.node(members[5]).data else {
                panic!("expected a field");
            };
            assert_eq!(*access, Access::Private);
        }

        #[test]
        fn records_contain_an_injected_class_name() {
            let unit = parse("class C { public: int v; };");
            let members = unit.children(top(&unit, 0));
            let NodeData::Record {
                name,
                tag,
                members: inner,
                injected,
                ..
            } = &unit.node(members[0]).data
            else {
                panic!("expected the injected class name");
            };
            assert!(*injected);
            assert_eq!(name, "C");
            assert_eq!(*tag, TagKind::Class);
            assert!(inner.is_empty());
            assert_eq!(unit.text_of(members[0]), "C");

            // Forward declarations have no body and no injected name.
            let unit = parse("class D;");
            assert!(unit.children(top(&unit, 0)).is_empty());
        }

        #[test]
        fn class_members_default_to_private() {
            let unit = parse("class C { int hidden; };");
            let members = unit.children(top(&unit, 0));
            assert_eq!(unit.node(members[0]).data.access(), Some(Access::Private));
            assert_eq!(unit.node(members[1]).data.access(), Some(Access::Private));

            let unit = parse("struct S { int open; };");
            let members = unit.children(top(&unit, 0));
            assert_eq!(unit.node(members[0]).data.access(), Some(Access::Public));
            assert_eq!(unit.node(members[1]).data.access(), Some(Access::Public));
        }

        #[test]
        fn namespace_using_typedef_enum() {
            let unit = parse(
                "namespace lib { int inner; }\nusing namespace lib;\ntypedef unsigned int size_type;\nenum Color { Red, Green = 2 };",
            );
            assert_eq!(unit.kind(top(&unit, 0)), NodeKind::Namespace);
            assert_eq!(unit.kind(top(&unit, 1)), NodeKind::UsingDirective);
            assert_eq!(unit.kind(top(&unit, 2)), NodeKind::Typedef);
            let NodeData::Enum { enumerators, .. } = &unit.node(top(&unit, 3)).data else {
                panic!("expected an enum");
            };
            assert_eq!(enumerators.len(), 2);
        }

        #[test]
        fn typedef_name_types_later_declarations() {
            let unit = parse("typedef int handle;\nvoid f() { handle h; }");
            let body = *unit.children(top(&unit, 1)).last().unwrap();
            assert_eq!(unit.kind(unit.children(body)[0]), NodeKind::DeclStmt);
        }

        #[test]
        fn comma_declarators_become_separate_declarations() {
            let unit = parse("void f() { int a = 1, b; }");
            let body = *unit.children(top(&unit, 0)).last().unwrap();
            let stmt = unit.children(body)[0];
            let NodeData::DeclStmt { decls } = &unit.node(stmt).data else {
                panic!("expected a declaration statement");
            };
            assert_eq!(decls.len(), 2);
            assert_eq!(unit.name_of(decls[0]), Some("a"));
            assert_eq!(unit.name_of(decls[1]), Some("b"));
        }

        #[test]
        fn pointer_and_reference_declarators() {
            let unit = parse("void f(const char* text, int& out);");
            let NodeData::Function { params, .. } = &unit.node(top(&unit, 0)).data else {
                panic!("expected a function");
            };
            let NodeData::Param { ty, .. } = &unit.node(params[0]).data else {
                panic!("expected a parameter");
            };
            assert!(matches!(ty.ty, Type::Pointer(_)));
            let NodeData::Param { ty, .. } = &unit.node(params[1]).data else {
                panic!("expected a parameter");
            };
            assert!(matches!(ty.ty, Type::LValueRef(_)));
        }
    }

    mod statements {
        use super::*;

        fn body_stmts(unit: &Unit) -> Vec<NodeId> {
            let body = *unit.children(top(unit, 0)).last().unwrap();
            unit.children(body)
        }

        #[test]
        fn statement_kinds() {
            let unit = parse(
                "void f() { ; break; continue; return 1; while (a) { } for (;;) { } if (a) b(); }",
            );
            let kinds: Vec<NodeKind> = body_stmts(&unit)
                .iter()
                .map(|id| unit.kind(*id))
                .collect();
            assert_eq!(
                kinds,
                vec![
                    NodeKind::Null,
                    NodeKind::Break,
                    NodeKind::Continue,
                    NodeKind::Return,
                    NodeKind::While,
                    NodeKind::For,
                    NodeKind::If,
                ]
            );
        }

        #[test]
        fn for_header_slots_may_be_empty() {
            let unit = parse("void f() { for (int i = 0; i < 9; i++) { } for (;;) { } }");
            let stmts = body_stmts(&unit);
            let NodeData::For {
                init, cond, step, ..
            } = &unit.node(stmts[0]).data
            else {
                panic!("expected a for");
            };
            assert!(init.is_some() && cond.is_some() && step.is_some());
            let NodeData::For {
                init, cond, step, ..
            } = &unit.node(stmts[1]).data
            else {
                panic!("expected a for");
            };
            assert!(init.is_none() && cond.is_none() && step.is_none());
        }

        #[test]
        fn expressions_are_statements() {
            let unit = parse("void f() { g(); x = 1; }");
            let kinds: Vec<NodeKind> = body_stmts(&unit)
                .iter()
                .map(|id| unit.kind(*id))
                .collect();
            assert_eq!(kinds, vec![NodeKind::Call, NodeKind::Binary]);
        }
    }

    mod expressions {
        use super::*;

        fn first_expr(unit: &Unit) -> NodeId {
            let body = *unit.children(top(unit, 0)).last().unwrap();
            unit.children(body)[0]
        }

        #[test]
        fn multiplication_binds_tighter_than_addition() {
            let unit = parse("void f() { r = a + b * c; }");
            let NodeData::Binary { op, rhs, .. } = &unit.node(first_expr(&unit)).data else {
                panic!("expected an assignment");
            };
            assert_eq!(*op, BinaryOp::Assign);
            let NodeData::Binary { op, rhs, .. } = &unit.node(*rhs).data else {
                panic!("expected an addition");
            };
            assert_eq!(*op, BinaryOp::Add);
            let NodeData::Binary { op, .. } = &unit.node(*rhs).data else {
                panic!("expected a multiplication");
            };
            assert_eq!(*op, BinaryOp::Mul);
        }

        #[test]
        fn member_access_records_arrow_flag() {
            let unit = parse("void f() { obj.field = ptr->field; }");
            let NodeData::Binary { lhs, rhs, .. } = &unit.node(first_expr(&unit)).data else {
                panic!("expected an assignment");
            };
            let NodeData::Member { arrow, .. } = &unit.node(*lhs).data else {
                panic!("expected member access");
            };
            assert!(!arrow);
            let NodeData::Member { arrow, .. } = &unit.node(*rhs).data else {
                panic!("expected member access");
            };
            assert!(arrow);
        }

        #[test]
        fn calls_carry_their_arguments() {
            let unit = parse("void f() { combine(1, x, \"s\"); }");
            let NodeData::Call { args, .. } = &unit.node(first_expr(&unit)).data else {
                panic!("expected a call");
            };
            assert_eq!(args.len(), 3);
        }

        #[test]
        fn parenthesized_expressions_keep_their_node() {
            let unit = parse("void f() { r = (a + b) * c; }");
            let NodeData::Binary { rhs, .. } = &unit.node(first_expr(&unit)).data else {
                panic!("expected an assignment");
            };
            let NodeData::Binary { lhs, .. } = &unit.node(*rhs).data else {
                panic!("expected a multiplication");
            };
            assert_eq!(unit.kind(*lhs), NodeKind::Paren);
        }

        #[test]
        fn prefix_and_postfix_increment_are_distinct() {
            let unit = parse("void f() { ++a; a++; }");
            let body = *unit.children(top(&unit, 0)).last().unwrap();
            let stmts = unit.children(body);
            let NodeData::Unary { op, .. } = &unit.node(stmts[0]).data else {
                panic!("expected unary");
            };
            assert_eq!(*op, UnaryOp::PreInc);
            let NodeData::Unary { op, .. } = &unit.node(stmts[1]).data else {
                panic!("expected unary");
            };
            assert_eq!(*op, UnaryOp::PostInc);
        }
    }

    mod errors {
        use super::*;

        #[test]
        fn unsupported_syntax_is_an_error() {
            assert!(Unit::parse_str("template <typename T> T id(T v);", "e.cc").is_err());
            assert!(Unit::parse_str("void f() { a + ; }", "e.cc").is_err());
            assert!(Unit::parse_str("class C {", "e.cc").is_err());
        }

        #[test]
        fn mismatched_destructor_name_is_an_error() {
            assert!(Unit::parse_str("class C { public: ~D(); };", "e.cc").is_err());
        }
    }
}
